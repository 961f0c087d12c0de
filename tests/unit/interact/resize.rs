use proptest::prelude::*;

use super::*;

fn tuning() -> InteractionTuning {
    InteractionTuning::default()
}

#[test]
fn zero_drag_keeps_bounds() {
    let start = rect_xywh(10.0, 20.0, 200.0, 100.0);
    for handle in Handle::CORNERS {
        assert_eq!(resize_box(start, handle, Vec2::ZERO, 16.0), start);
    }
}

#[test]
fn horizontal_drag_scales_height_proportionally() {
    let start = rect_xywh(0.0, 0.0, 200.0, 100.0);
    let r = resize_box(start, Handle::BottomRight, Vec2::new(100.0, 0.0), 16.0);
    assert_eq!((r.width(), r.height()), (300.0, 150.0));
    assert_eq!((r.x0, r.y0), (0.0, 0.0));
}

#[test]
fn top_left_keeps_bottom_right_fixed() {
    let start = rect_xywh(100.0, 100.0, 200.0, 100.0);
    let r = resize_box(start, Handle::TopLeft, Vec2::new(-50.0, -10.0), 16.0);
    assert_eq!((r.width(), r.height()), (250.0, 125.0));
    assert_eq!((r.x1, r.y1), (300.0, 200.0));
}

#[test]
fn shrinking_is_floored_at_the_minimum() {
    let start = rect_xywh(0.0, 0.0, 200.0, 100.0);
    let r = resize_box(start, Handle::BottomRight, Vec2::new(-500.0, -500.0), 16.0);
    assert_eq!((r.width(), r.height()), (32.0, 16.0));
}

#[test]
fn side_width_is_damped_and_quantized() {
    let t = tuning();
    // 2 * 10 * 0.75 = 15, snapped to the 2px step.
    assert_eq!(text_side_width(300.0, Handle::MiddleRight, 10.0, &t), 316.0);
    assert_eq!(text_side_width(300.0, Handle::MiddleLeft, 10.0, &t), 286.0);
    assert_eq!(text_side_width(300.0, Handle::MiddleRight, -1000.0, &t), 120.0);
}

#[test]
fn text_corner_scales_font_and_width() {
    let t = tuning();
    let start = rect_xywh(0.0, 0.0, 200.0, 100.0);
    let out = text_corner_scale(
        start,
        Handle::BottomRight,
        Vec2::new(200.0, 100.0),
        40.0,
        Some(300.0),
        &t,
    );
    // s = 2, damped to 1.65.
    assert_eq!(out.font_px, 66.0);
    assert_eq!(out.max_width, 496.0);
}

#[test]
fn text_corner_never_goes_below_minimum_font() {
    let t = tuning();
    let start = rect_xywh(0.0, 0.0, 200.0, 20.0);
    let out = text_corner_scale(start, Handle::TopLeft, Vec2::new(190.0, 19.0), 10.0, None, &t);
    assert!(out.font_px >= t.min_font_px);
    assert!(out.max_width >= t.min_text_width);
}

proptest! {
    #[test]
    fn box_resize_preserves_aspect_and_minimum(
        w in 20.0f64..800.0,
        h in 20.0f64..800.0,
        dx in -1000.0f64..1000.0,
        dy in -1000.0f64..1000.0,
        corner in 0usize..4,
    ) {
        let (w, h) = (w.round(), h.round());
        let start = rect_xywh(50.0, 50.0, w, h);
        let handle = Handle::CORNERS[corner];
        let r = resize_box(start, handle, Vec2::new(dx, dy), 16.0);
        prop_assert!(r.width() >= 16.0 && r.height() >= 16.0);
        let expected_h = (r.width() * h / w).round().max(16.0);
        prop_assert!((r.height() - expected_h).abs() <= 1.0);
    }

    #[test]
    fn box_resize_keeps_opposite_corner(
        dx in -300.0f64..300.0,
        dy in -300.0f64..300.0,
    ) {
        let start = rect_xywh(100.0, 100.0, 160.0, 90.0);
        let r = resize_box(start, Handle::BottomRight, Vec2::new(dx, dy), 16.0);
        prop_assert_eq!((r.x0, r.y0), (100.0, 100.0));
        let r = resize_box(start, Handle::TopLeft, Vec2::new(dx, dy), 16.0);
        prop_assert_eq!((r.x1, r.y1), (260.0, 190.0));
    }
}
