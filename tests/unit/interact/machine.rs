use std::{sync::Arc, time::Duration};

use super::*;
use crate::{
    config::RenderOpts,
    foundation::{color::Color, core::Size},
    resources::{
        decode::DecodedImage,
        media::{MediaOpener, SequenceMediaOpener},
    },
    scene::model::{ImageAsset, TextAsset, VideoAsset},
    text::{engine::TextEngine, font::FontSpec},
};

struct Fixture {
    scene: Scene,
    renderer: Renderer,
    history: History,
    fsm: Interaction,
}

impl Fixture {
    fn new() -> Self {
        let mut renderer = Renderer::new(RenderOpts::default(), TextEngine::new());
        renderer.resize(Size::new(800.0, 600.0), 1.0, false).unwrap();
        Self {
            scene: Scene::new(),
            renderer,
            history: History::default(),
            fsm: Interaction::default(),
        }
    }

    fn board(&mut self) -> (Board<'_>, &mut Interaction) {
        (
            Board {
                scene: &mut self.scene,
                renderer: &mut self.renderer,
                history: &mut self.history,
            },
            &mut self.fsm,
        )
    }

    fn down(&mut self, x: f64, y: f64, mods: Modifiers) -> Response {
        let (mut board, fsm) = self.board();
        fsm.pointer_down(&mut board, Point::new(x, y), mods)
    }

    fn drag_to(&mut self, x: f64, y: f64) -> Response {
        let (mut board, fsm) = self.board();
        fsm.pointer_move(&mut board, Point::new(x, y))
    }

    fn up(&mut self) -> Response {
        let (mut board, fsm) = self.board();
        fsm.pointer_up(&mut board)
    }

    fn bounds(&mut self, id: AssetId) -> Rect {
        let asset = self.scene.get(id).unwrap();
        self.renderer.asset_bounds(asset)
    }
}

fn image(x: f64, y: f64, w: f64, h: f64) -> Asset {
    Asset::Image(ImageAsset {
        x,
        y,
        width: w,
        height: h,
        bitmap: Some(Arc::new(DecodedImage::solid(2, 2, [0, 0, 255, 255]).unwrap())),
        loaded: true,
        natural_width: 2,
        natural_height: 2,
        source: "blue.png".to_owned(),
    })
}

fn label(x: f64, y: f64, text: &str) -> Asset {
    Asset::Text(TextAsset {
        x,
        y,
        text: text.to_owned(),
        color: Color::BLACK,
        font: FontSpec::default().with_size_px(20.0),
        max_width: None,
        align: TextAlign::Center,
    })
}

fn open_ready(media: &SequenceMediaOpener) -> Box<dyn crate::resources::media::VideoSource> {
    let frame = Arc::new(DecodedImage::solid(16, 9, [0, 255, 0, 255]).unwrap());
    media.register("clip.mp4", vec![frame], 30.0).unwrap();
    let mut handle = media.open_video("clip.mp4").unwrap();
    handle.poll_frame(Duration::ZERO);
    handle
}

#[test]
fn move_gesture_checkpoints_once() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));

    let r = f.down(150.0, 150.0, Modifiers::NONE);
    assert_eq!(r.cursor, Cursor::Move);
    assert_eq!(f.fsm.kind(), GestureKind::Moving);
    assert!(f.scene.is_selected(id));
    assert!(f.fsm.gesture_active());

    let mut checkpoints = 0;
    for step in 1..=5 {
        let r = f.drag_to(150.0 + 10.0 * f64::from(step), 150.0);
        checkpoints += usize::from(r.checkpoint);
    }
    assert_eq!(checkpoints, 1);
    assert_eq!(f.history.undo_len(), 1);
    assert_eq!(f.scene.get(id).unwrap().origin(), Point::new(150.0, 100.0));

    f.up();
    assert_eq!(f.fsm.kind(), GestureKind::Idle);
    assert!(!f.fsm.gesture_active());
}

#[test]
fn click_without_drag_records_nothing() {
    let mut f = Fixture::new();
    f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));
    f.down(150.0, 150.0, Modifiers::NONE);
    f.up();
    assert_eq!(f.history.undo_len(), 0);
}

#[test]
fn moving_translates_every_selected_asset_and_undoes() {
    let media = SequenceMediaOpener::new();
    let mut f = Fixture::new();
    let a = f.scene.add_asset(image(0.0, 0.0, 50.0, 50.0));
    let b = f.scene.add_asset(image(200.0, 0.0, 50.0, 50.0));
    f.scene.set_selection([a, b]);

    // Shift keeps the existing selection.
    f.down(20.0, 20.0, Modifiers::shift());
    f.drag_to(30.0, 25.0);
    f.drag_to(40.0, 30.0);
    f.up();
    assert_eq!(f.scene.get(a).unwrap().origin(), Point::new(20.0, 10.0));
    assert_eq!(f.scene.get(b).unwrap().origin(), Point::new(220.0, 10.0));

    assert!(f.history.undo(&mut f.scene, &media));
    let xs: Vec<f64> = f.scene.iter().map(|(_, asset)| asset.origin().x).collect();
    assert_eq!(xs, vec![0.0, 200.0]);
}

#[test]
fn modifiers_add_or_toggle() {
    let mut f = Fixture::new();
    let a = f.scene.add_asset(image(0.0, 0.0, 50.0, 50.0));
    let b = f.scene.add_asset(image(100.0, 0.0, 50.0, 50.0));

    f.down(20.0, 20.0, Modifiers::NONE);
    f.up();
    f.down(120.0, 20.0, Modifiers::shift());
    f.up();
    assert!(f.scene.is_selected(a) && f.scene.is_selected(b));

    // Shift alone never removes.
    f.down(120.0, 20.0, Modifiers::shift());
    f.up();
    assert!(f.scene.is_selected(b));

    f.down(120.0, 20.0, Modifiers::ctrl());
    f.up();
    assert!(f.scene.is_selected(a) && !f.scene.is_selected(b));

    f.down(120.0, 20.0, Modifiers::NONE);
    f.up();
    assert_eq!(f.scene.selected_in_order(), vec![b]);
}

#[test]
fn dragging_after_toggling_off_the_last_selection_does_nothing() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));
    f.scene.select_only(id);

    f.down(150.0, 150.0, Modifiers::ctrl());
    assert!(f.scene.selection().is_empty());
    assert_eq!(f.fsm.kind(), GestureKind::Idle);

    let r = f.drag_to(200.0, 180.0);
    assert!(!r.checkpoint);
    f.up();
    assert_eq!(f.history.undo_len(), 0);
    assert_eq!(f.scene.get(id).unwrap().origin(), Point::new(100.0, 100.0));
}

#[test]
fn corner_resize_keeps_aspect_and_checkpoints_once() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));
    f.scene.select_only(id);

    let r = f.down(300.0, 200.0, Modifiers::NONE);
    assert_eq!(f.fsm.kind(), GestureKind::Resizing);
    assert_eq!(r.cursor, Cursor::NwseResize);

    f.drag_to(350.0, 200.0);
    f.drag_to(400.0, 200.0);
    assert_eq!(f.bounds(id), Rect::new(100.0, 100.0, 400.0, 250.0));
    assert_eq!(f.history.undo_len(), 1);
    f.up();

    // Dragging back to the start restores the original box.
    f.down(400.0, 250.0, Modifiers::NONE);
    f.drag_to(300.0, 200.0);
    f.up();
    assert_eq!(f.bounds(id), Rect::new(100.0, 100.0, 300.0, 200.0));
    assert_eq!(f.history.undo_len(), 2);
}

#[test]
fn handle_outside_the_body_starts_a_resize() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));
    f.scene.select_only(id);

    // Top-left handle extends 5px outside the box.
    f.down(96.0, 96.0, Modifiers::NONE);
    assert_eq!(f.fsm.kind(), GestureKind::Resizing);
    f.drag_to(46.0, 96.0);
    assert_eq!(f.bounds(id), Rect::new(50.0, 75.0, 300.0, 200.0));
}

#[test]
fn text_side_handle_changes_wrap_width_only() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(label(400.0, 100.0, "hello world"));
    f.scene.select_only(id);
    let b = f.bounds(id);
    let start = Point::new(b.x1, b.y0 + (b.height() / 2.0).round());

    f.down(start.x, start.y, Modifiers::NONE);
    assert_eq!(f.fsm.hovered_handle(), None);
    assert_eq!(f.fsm.kind(), GestureKind::Resizing);
    f.drag_to(start.x + 20.0, start.y + 40.0);
    f.drag_to(start.x + 20.0, start.y);

    let expected = text_side_width(b.width(), Handle::MiddleRight, 20.0, f.fsm.tuning());
    let Some(Asset::Text(t)) = f.scene.get(id) else {
        panic!("text asset expected");
    };
    assert_eq!(t.max_width, Some(expected));
    assert_eq!(t.font.size_px, 20.0);
    assert_eq!((t.x, t.y), (400.0, 100.0));
    assert_eq!(f.history.undo_len(), 1);
}

#[test]
fn text_corner_handle_scales_font_from_gesture_start() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(label(400.0, 100.0, "hello world"));
    f.scene.select_only(id);
    let b = f.bounds(id);

    f.down(b.x1, b.y1, Modifiers::NONE);
    assert_eq!(f.fsm.kind(), GestureKind::Resizing);
    let target = Point::new(b.x1 + b.width(), b.y1 + b.height());
    // Repeated samples at the same point must not compound.
    for _ in 0..4 {
        f.drag_to(target.x, target.y);
    }
    f.up();

    let Some(Asset::Text(t)) = f.scene.get(id) else {
        panic!("text asset expected");
    };
    // Doubling both axes damps to 1.65.
    assert_eq!(t.font.size_px, 33.0);
    let after = f.bounds(id);
    assert_eq!((after.x0, after.y0), (b.x0, b.y0));
}

#[test]
fn marquee_selects_strictly_overlapping_assets() {
    let mut f = Fixture::new();
    let a = f.scene.add_asset(image(100.0, 100.0, 100.0, 100.0));
    let touching = f.scene.add_asset(image(160.0, 300.0, 50.0, 50.0));
    let far = f.scene.add_asset(image(500.0, 400.0, 50.0, 50.0));

    let r = f.down(10.0, 10.0, Modifiers::NONE);
    assert_eq!(f.fsm.kind(), GestureKind::MarqueeSelecting);
    assert_eq!(r.cursor, Cursor::Default);
    f.drag_to(160.0, 300.0);
    assert_eq!(f.fsm.marquee(), Some(Rect::new(10.0, 10.0, 160.0, 300.0)));
    assert!(f.fsm.overlay().marquee.is_some());
    assert!(f.scene.is_selected(a));
    assert!(!f.scene.is_selected(touching));
    assert!(!f.scene.is_selected(far));
    assert_eq!(f.scene.hovered(), None);

    f.up();
    assert_eq!(f.scene.selected_in_order(), vec![a]);
    assert_eq!(f.fsm.marquee(), None);
    assert_eq!(f.history.undo_len(), 0);
}

#[test]
fn additive_marquee_keeps_the_previous_selection() {
    let mut f = Fixture::new();
    let a = f.scene.add_asset(image(100.0, 100.0, 50.0, 50.0));
    let b = f.scene.add_asset(image(400.0, 400.0, 50.0, 50.0));
    f.scene.select_only(b);

    f.down(90.0, 90.0, Modifiers::shift());
    f.drag_to(120.0, 120.0);
    f.up();
    assert_eq!(f.scene.selected_in_order(), vec![a, b]);

    f.down(90.0, 90.0, Modifiers::NONE);
    f.drag_to(120.0, 120.0);
    f.up();
    assert_eq!(f.scene.selected_in_order(), vec![a]);
}

#[test]
fn tiny_marquee_is_a_click_on_empty_space() {
    let mut f = Fixture::new();
    let a = f.scene.add_asset(image(100.0, 100.0, 50.0, 50.0));
    f.scene.select_only(a);

    f.down(500.0, 500.0, Modifiers::shift());
    f.drag_to(502.0, 501.0);
    f.up();
    assert!(f.scene.is_selected(a));

    f.down(500.0, 500.0, Modifiers::NONE);
    f.drag_to(502.0, 501.0);
    f.up();
    assert!(f.scene.selection().is_empty());
}

#[test]
fn clicking_the_video_overlay_toggles_playback() {
    let media = SequenceMediaOpener::new();
    let mut f = Fixture::new();
    let id = f.scene.add_asset(Asset::Video(VideoAsset {
        x: 100.0,
        y: 100.0,
        width: 160.0,
        height: 90.0,
        media: open_ready(&media),
        ready: true,
        sized_from_metadata: true,
        source: "clip.mp4".to_owned(),
    }));

    let r = f.down(180.0, 145.0, Modifiers::NONE);
    assert!(r.toggled_video);
    assert_eq!(f.fsm.kind(), GestureKind::Idle);
    assert!(!f.scene.is_selected(id));
    assert!(f.scene.any_video_playing());

    f.down(190.0, 150.0, Modifiers::NONE);
    assert!(!f.scene.any_video_playing());

    // Outside the overlay the video is selected as usual.
    f.down(110.0, 120.0, Modifiers::NONE);
    assert!(f.scene.is_selected(id));
    assert_eq!(f.fsm.kind(), GestureKind::Moving);
}

#[test]
fn clicking_the_surface_center_toggles_a_background_video() {
    let media = SequenceMediaOpener::new();
    let mut f = Fixture::new();
    f.scene.set_background(Some(Background::Video {
        media: open_ready(&media),
        ready: true,
        source: "clip.mp4".to_owned(),
    }));

    let r = f.down(400.0, 300.0, Modifiers::NONE);
    assert!(r.toggled_video);
    assert_eq!(f.fsm.kind(), GestureKind::Idle);
    let playing = match f.scene.background() {
        Some(Background::Video { media, .. }) => media.is_playing(),
        _ => false,
    };
    assert!(playing);

    f.down(10.0, 10.0, Modifiers::NONE);
    assert_eq!(f.fsm.kind(), GestureKind::MarqueeSelecting);
}

#[test]
fn idle_cursor_reflects_what_is_under_the_pointer() {
    let mut f = Fixture::new();
    let id = f.scene.add_asset(image(100.0, 100.0, 200.0, 100.0));

    assert_eq!(f.drag_to(50.0, 50.0).cursor, Cursor::Default);
    let r = f.drag_to(150.0, 150.0);
    assert_eq!(r.cursor, Cursor::Move);
    assert!(r.redraw);
    assert_eq!(f.scene.hovered(), Some(id));

    f.scene.select_only(id);
    assert_eq!(f.drag_to(300.0, 100.0).cursor, Cursor::NeswResize);
    assert_eq!(f.fsm.hovered_handle(), Some(Handle::TopRight));
    assert_eq!(f.drag_to(100.0, 200.0).cursor, Cursor::NeswResize);
    assert_eq!(f.drag_to(300.0, 200.0).cursor, Cursor::NwseResize);
}

#[test]
fn modifier_helpers() {
    assert!(!Modifiers::NONE.additive());
    assert!(Modifiers::shift().additive() && !Modifiers::shift().toggles());
    assert!(Modifiers::ctrl().toggles() && Modifiers::ctrl().command());
    let alt = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };
    assert!(alt.toggles() && !alt.command());
}
