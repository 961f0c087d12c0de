use super::*;
use crate::{
    foundation::core::Vec2,
    resources::media::SequenceMediaOpener,
    scene::model::{Asset, ImageAsset},
};

fn image(x: f64) -> Asset {
    Asset::Image(ImageAsset {
        x,
        y: 0.0,
        width: 10.0,
        height: 10.0,
        bitmap: None,
        loaded: false,
        natural_width: 0,
        natural_height: 0,
        source: "a.png".to_owned(),
    })
}

fn xs(scene: &Scene) -> Vec<f64> {
    scene.iter().map(|(_, a)| a.origin().x).collect()
}

#[test]
fn undo_and_redo_round_trip() {
    let media = SequenceMediaOpener::new();
    let mut scene = Scene::new();
    let mut history = History::new(50);

    history.push(&scene);
    let id = scene.add_asset(image(0.0));
    history.push(&scene);
    scene.get_mut(id).unwrap().translate(Vec2::new(5.0, 0.0));

    assert!(history.undo(&mut scene, &media));
    assert_eq!(xs(&scene), vec![0.0]);
    assert!(history.undo(&mut scene, &media));
    assert!(scene.is_empty());
    assert!(!history.undo(&mut scene, &media));

    assert!(history.redo(&mut scene, &media));
    assert!(history.redo(&mut scene, &media));
    assert_eq!(xs(&scene), vec![5.0]);
    assert!(!history.redo(&mut scene, &media));
}

#[test]
fn push_discards_redo() {
    let media = SequenceMediaOpener::new();
    let mut scene = Scene::new();
    let mut history = History::new(50);
    history.push(&scene);
    scene.add_asset(image(0.0));
    history.undo(&mut scene, &media);
    assert!(history.can_redo());
    history.push(&scene);
    assert!(!history.can_redo());
}

#[test]
fn oldest_entries_are_dropped_past_the_limit() {
    let media = SequenceMediaOpener::new();
    let mut scene = Scene::new();
    let mut history = History::new(3);
    for i in 0..5 {
        history.push(&scene);
        scene.add_asset(image(f64::from(i)));
    }
    assert_eq!(history.undo_len(), 3);
    while history.undo(&mut scene, &media) {}
    // The two earliest states are gone; the oldest reachable one has two assets.
    assert_eq!(scene.len(), 2);
}

#[test]
fn undo_clears_selection() {
    let media = SequenceMediaOpener::new();
    let mut scene = Scene::new();
    let mut history = History::default();
    let id = scene.add_asset(image(0.0));
    history.push(&scene);
    scene.select_only(id);
    history.undo(&mut scene, &media);
    assert!(scene.selection().is_empty());
    assert_eq!(history.limit(), 50);
}
