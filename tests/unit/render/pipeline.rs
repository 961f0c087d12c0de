use std::{sync::Arc, time::Duration};

use super::*;
use crate::{
    resources::{
        decode::DecodedImage,
        media::{MediaOpener, SequenceMediaOpener},
    },
    scene::model::{ImageAsset, TextAsset, VideoAsset},
};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn renderer(w: f64, h: f64, dpr: f64) -> Renderer {
    let mut r = Renderer::new(RenderOpts::default(), TextEngine::new());
    r.resize(Size::new(w, h), dpr, false).unwrap();
    r
}

fn solid(w: u32, h: u32, px: [u8; 4]) -> Arc<DecodedImage> {
    Arc::new(DecodedImage::solid(w, h, px).unwrap())
}

fn red_box(x: f64, y: f64, w: f64, h: f64) -> Asset {
    Asset::Image(ImageAsset {
        x,
        y,
        width: w,
        height: h,
        bitmap: Some(solid(4, 4, RED)),
        loaded: true,
        natural_width: 4,
        natural_height: 4,
        source: "red.png".to_owned(),
    })
}

fn label(text: &str) -> Asset {
    Asset::Text(TextAsset {
        x: 50.0,
        y: 10.0,
        text: text.to_owned(),
        color: Color::BLACK,
        font: FontSpec::default().with_size_px(20.0),
        max_width: None,
        align: TextAlign::Center,
    })
}

fn ready_video(media: &SequenceMediaOpener) -> Asset {
    media
        .register("clip.mp4", vec![solid(8, 8, GREEN)], 30.0)
        .unwrap();
    let mut handle = media.open_video("clip.mp4").unwrap();
    handle.poll_frame(Duration::ZERO);
    Asset::Video(VideoAsset {
        x: 10.0,
        y: 10.0,
        width: 60.0,
        height: 40.0,
        media: handle,
        ready: true,
        sized_from_metadata: true,
        source: "clip.mp4".to_owned(),
    })
}

#[test]
fn draws_canvas_and_loaded_images() {
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    scene.add_asset(red_box(10.0, 10.0, 50.0, 50.0));

    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!((frame.width, frame.height), (100, 80));
    assert_eq!(frame.pixel(30, 30), Some(RED));
    assert_eq!(frame.pixel(80, 70), Some(WHITE));
}

#[test]
fn unloaded_images_are_skipped() {
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    let mut asset = red_box(10.0, 10.0, 50.0, 50.0);
    if let Asset::Image(img) = &mut asset {
        img.loaded = false;
    }
    scene.add_asset(asset);
    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(frame.pixel(30, 30), Some(WHITE));
}

#[test]
fn redrawing_an_unchanged_scene_is_idempotent() {
    let mut r = renderer(120.0, 90.0, 1.0);
    r.set_grid_enabled(true);
    let mut scene = Scene::new();
    let id = scene.add_asset(red_box(10.0, 10.0, 50.0, 50.0));
    scene.add_asset(label("hello"));
    scene.select_only(id);

    let a = r.draw(&scene, &Overlay::default()).unwrap();
    let b = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(r.stats().frames, 2);
}

#[test]
fn device_ratio_is_clamped_and_dropped_during_gestures() {
    let mut r = renderer(100.0, 80.0, 3.0);
    assert_eq!(r.dpr(), 2.0);
    assert_eq!(r.device_size(), (200, 160));

    let scene = Scene::new();
    let moving = Overlay {
        marquee: None,
        gesture_active: true,
    };
    let frame = r.draw(&scene, &moving).unwrap();
    assert_eq!((frame.width, frame.height), (100, 80));

    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!((frame.width, frame.height), (200, 160));

    r.set_low_quality(true);
    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!((frame.width, frame.height), (100, 80));
}

#[test]
fn nonpositive_host_ratio_means_one() {
    let r = renderer(50.0, 50.0, 0.0);
    assert_eq!(r.dpr(), 1.0);
    let r = renderer(50.0, 50.0, f64::NAN);
    assert_eq!(r.dpr(), 1.0);
}

#[test]
fn grid_layer_is_rebuilt_only_when_geometry_changes() {
    let mut r = renderer(200.0, 100.0, 1.0);
    r.set_grid_enabled(true);
    let scene = Scene::new();
    r.draw(&scene, &Overlay::default()).unwrap();
    r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(r.stats().grid_rebuilds, 1);

    r.resize(Size::new(300.0, 100.0), 1.0, false).unwrap();
    r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(r.stats().grid_rebuilds, 2);
}

#[test]
fn background_layer_follows_background_revision() {
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    scene.set_background(Some(Background::Image {
        bitmap: Some(solid(4, 4, GREEN)),
        source: "bg.png".to_owned(),
    }));

    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(frame.pixel(50, 40), Some(GREEN));
    r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(r.stats().background_rebuilds, 1);

    scene.add_asset(red_box(0.0, 0.0, 10.0, 10.0));
    r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(r.stats().background_rebuilds, 1);

    scene.clear_background();
    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(frame.pixel(50, 40), Some(WHITE));
}

#[test]
fn hit_test_prefers_topmost_and_includes_edges() {
    let mut r = renderer(200.0, 200.0, 1.0);
    let mut scene = Scene::new();
    let below = scene.add_asset(red_box(0.0, 0.0, 100.0, 100.0));
    let above = scene.add_asset(red_box(50.0, 50.0, 100.0, 100.0));
    scene.add_asset(red_box(180.0, 180.0, 0.0, 0.0));

    assert_eq!(r.hit_test(&scene, Point::new(75.0, 75.0)), Some(above));
    assert_eq!(r.hit_test(&scene, Point::new(10.0, 10.0)), Some(below));
    assert_eq!(r.hit_test(&scene, Point::new(150.0, 150.0)), Some(above));
    assert_eq!(r.hit_test(&scene, Point::new(180.0, 180.0)), None);
    assert_eq!(r.hit_test(&scene, Point::new(199.0, 5.0)), None);
}

#[test]
fn handles_belong_to_the_sole_selection() {
    let mut r = renderer(200.0, 200.0, 1.0);
    let mut scene = Scene::new();
    let a = scene.add_asset(red_box(20.0, 20.0, 100.0, 60.0));
    let b = scene.add_asset(red_box(150.0, 150.0, 20.0, 20.0));

    assert_eq!(r.handle_at(&scene, Point::new(20.0, 20.0)), None);
    scene.select_only(a);
    assert_eq!(
        r.handle_at(&scene, Point::new(120.0, 80.0)),
        Some((a, Handle::BottomRight))
    );
    // Images have no side handles.
    assert_eq!(r.handle_at(&scene, Point::new(20.0, 50.0)), None);

    scene.add_to_selection(b);
    assert_eq!(r.handle_at(&scene, Point::new(120.0, 80.0)), None);
}

#[test]
fn text_gets_side_handles() {
    let mut r = renderer(400.0, 200.0, 1.0);
    let mut scene = Scene::new();
    let id = scene.add_asset(label("wide label"));
    scene.select_only(id);
    let b = r.asset_bounds(scene.get(id).unwrap());
    let mid = Point::new(b.x1, b.y0 + (b.height() / 2.0).round());
    assert_eq!(r.handle_at(&scene, mid), Some((id, Handle::MiddleRight)));
}

#[test]
fn selection_outline_is_drawn_over_the_asset() {
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    let id = scene.add_asset(red_box(10.0, 10.0, 50.0, 50.0));
    scene.select_only(id);
    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    let px = frame.pixel(9, 35).unwrap();
    assert!(px[2] > 200 && px[0] < 150, "expected indigo, got {px:?}");
}

#[test]
fn marquee_tints_its_area() {
    let mut r = renderer(100.0, 80.0, 1.0);
    let scene = Scene::new();
    let overlay = Overlay {
        marquee: Some(rect_xywh(20.0, 20.0, 40.0, 30.0)),
        gesture_active: false,
    };
    let frame = r.draw(&scene, &overlay).unwrap();
    let inside = frame.pixel(40, 35).unwrap();
    assert!(inside[0] < 245 && inside[2] > inside[0], "expected tint, got {inside:?}");
    assert_eq!(frame.pixel(80, 70), Some(WHITE));
}

#[test]
fn video_surfaces_are_reused_and_pruned() {
    let media = SequenceMediaOpener::new();
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    let id = scene.add_asset(ready_video(&media));

    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(frame.pixel(12, 12), Some(GREEN));
    r.draw(&scene, &Overlay::default()).unwrap();
    let stats = r.stats();
    assert_eq!((stats.video_surfaces, stats.video_repaints), (1, 1));

    scene.select_only(id);
    scene.delete_selected();
    r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(r.stats().video_surfaces, 0);
}

#[test]
fn videos_without_a_frame_are_not_drawn() {
    let media = SequenceMediaOpener::new();
    let mut r = renderer(100.0, 80.0, 1.0);
    let mut scene = Scene::new();
    let mut asset = ready_video(&media);
    if let Some(v) = asset.as_video_mut() {
        v.ready = false;
    }
    scene.add_asset(asset);
    let frame = r.draw(&scene, &Overlay::default()).unwrap();
    assert_eq!(frame.pixel(12, 12), Some(WHITE));
    assert_eq!(r.stats().video_surfaces, 0);
}
