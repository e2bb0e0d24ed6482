use super::*;
use crate::animation::sampler::SampleReport;
use crate::foundation::core::Transform;
use crate::scene::asset::{Asset, AssetId};
use crate::timeline::clock::PlaybackClock;
use crate::timeline::context::{PlaybackState, Scene};

fn widget() -> Rect {
    Rect::new(100.0, 0.0, 500.0, 20.0)
}

fn setup() -> (EditorContext, AssetId) {
    let mut scene = Scene::default();
    let id = AssetId::new("a");
    scene.assets.push(Asset::image(id.clone(), "a.png", scene.canvas));
    (EditorContext::new(scene), id)
}

#[test]
fn time_at_maps_and_clamps() {
    assert_eq!(time_at(300.0, widget()).unwrap(), 50.0);
    assert_eq!(time_at(200.0, widget()).unwrap(), 25.0);
    assert_eq!(time_at(0.0, widget()).unwrap(), 0.0);
    assert_eq!(time_at(9000.0, widget()).unwrap(), 100.0);
}

#[test]
fn time_at_rejects_degenerate_widget() {
    assert!(time_at(10.0, Rect::new(5.0, 0.0, 5.0, 10.0)).is_err());
    assert!(time_at(f64::NAN, widget()).is_err());
}

#[test]
fn pointer_down_outside_is_ignored() {
    let (mut ctx, _) = setup();
    let mut scrub = ScrubController::new();
    let out = scrub
        .pointer_down(&mut ctx, Point::new(50.0, 5.0), widget())
        .unwrap();
    assert!(out.is_none());
    assert!(!scrub.is_tracking());
    assert_eq!(ctx.driver(), TimeDriver::Idle);
}

#[test]
fn drag_seeks_and_snaps() {
    let (mut ctx, id) = setup();
    let key = Transform::new(9.0, 9.0, 90.0, 90.0, 0.0);
    ctx.add_or_update_keyframe_at(&id, 75.0, key).unwrap();

    let mut scrub = ScrubController::new();
    scrub
        .pointer_down(&mut ctx, Point::new(300.0, 5.0), widget())
        .unwrap();
    assert_eq!(ctx.driver(), TimeDriver::Scrub);
    assert_eq!(ctx.position(), 50.0);

    // Moves outside the widget still track.
    let report = scrub.pointer_move(&mut ctx, 401.0, widget()).unwrap();
    assert_eq!(report, Some(SampleReport { updated: 1, skipped: 0 }));
    assert_eq!(ctx.asset(&id).unwrap().transform, key);

    scrub.pointer_move(&mut ctx, -50.0, widget()).unwrap();
    assert_eq!(ctx.position(), 0.0);

    scrub.pointer_up(&mut ctx);
    assert!(!scrub.is_tracking());
    assert_eq!(ctx.driver(), TimeDriver::Idle);
    assert!(scrub.pointer_move(&mut ctx, 300.0, widget()).unwrap().is_none());
}

#[test]
fn scrub_pauses_playback_and_play_suspends_scrub() {
    let (mut ctx, _) = setup();
    let clock = PlaybackClock::default();
    let mut scrub = ScrubController::new();

    clock.play(&mut ctx).unwrap();
    scrub
        .pointer_down(&mut ctx, Point::new(200.0, 5.0), widget())
        .unwrap();
    assert_eq!(ctx.playback(), PlaybackState::Stopped);

    clock.play(&mut ctx).unwrap();
    assert!(scrub.pointer_move(&mut ctx, 400.0, widget()).unwrap().is_none());
    assert!(!scrub.is_tracking());
    assert_eq!(ctx.position(), 25.0);

    // A stale pointer-up does not steal ownership back from playback.
    scrub.pointer_up(&mut ctx);
    assert_eq!(ctx.driver(), TimeDriver::Playback);
}

#[test]
fn scrub_is_refused_during_export() {
    let (mut ctx, _) = setup();
    ctx.acquire(TimeDriver::Export).unwrap();
    let mut scrub = ScrubController::new();
    let err = scrub
        .pointer_down(&mut ctx, Point::new(200.0, 5.0), widget())
        .unwrap_err();
    assert!(matches!(err, EasyAnimError::Busy(_)));
    assert!(!scrub.is_tracking());
}
