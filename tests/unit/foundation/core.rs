use super::*;

#[test]
fn premul_rounds_like_straight_to_premul_conversion() {
    let c = Rgba8Premul::from_straight_rgba(200, 100, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, ((200u16 * 128 + 127) / 255) as u8);
    assert_eq!(c.g, ((100u16 * 128 + 127) / 255) as u8);
    assert_eq!(c.b, 0);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
}

#[test]
fn overlap_is_strict_interior() {
    let a = rect_xywh(0.0, 0.0, 10.0, 10.0);
    assert!(rects_overlap(a, rect_xywh(9.0, 9.0, 5.0, 5.0)));
    assert!(!rects_overlap(a, rect_xywh(10.0, 0.0, 5.0, 5.0)));
    assert!(!rects_overlap(a, rect_xywh(0.0, 10.0, 5.0, 5.0)));
}

#[test]
fn frame_pixel_lookup_and_unpremultiply() {
    let mut frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![255, 255, 255, 255, 64, 0, 0, 128],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(2, 0), None);

    frame.unpremultiply();
    assert!(!frame.premultiplied);
    assert_eq!(frame.pixel(1, 0), Some([128, 0, 0, 128]));
}
