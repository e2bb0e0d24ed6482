use super::*;
use crate::scene::asset::{AssetId, TextStyle};

fn kf(time: f64, x: f64) -> Keyframe {
    Keyframe::new(time, Transform::new(x, x, 100.0, 100.0, 0.0))
}

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn empty_sequence_samples_nothing() {
    assert_eq!(sample(42.0, &[]), None);
}

#[test]
fn keyframe_times_are_fixed_points() {
    let keys = [kf(0.0, 0.0), kf(40.0, 10.0), kf(90.0, 30.0)];
    for k in &keys {
        assert_eq!(sample(k.time, &keys), Some(k.transform));
    }
}

#[test]
fn holds_first_and_last_outside_range() {
    let keys = [kf(20.0, 5.0), kf(80.0, 50.0)];
    assert_eq!(sample(0.0, &keys), Some(keys[0].transform));
    assert_eq!(sample(100.0, &keys), Some(keys[1].transform));
}

#[test]
fn interpolates_linearly() {
    let keys = [kf(0.0, 0.0), kf(100.0, 100.0)];
    approx(sample(50.0, &keys).unwrap().x, 50.0);

    let keys = [
        Keyframe::new(0.0, Transform::new(0.0, 0.0, 100.0, 100.0, 0.0)),
        Keyframe::new(100.0, Transform::new(0.0, 0.0, 200.0, 100.0, 0.0)),
    ];
    let t = sample(25.0, &keys).unwrap();
    approx(t.width, 125.0);
    approx(t.height, 100.0);
}

#[test]
fn rotation_is_not_shortest_path() {
    let keys = [
        Keyframe::new(0.0, Transform::new(0.0, 0.0, 50.0, 50.0, 10.0)),
        Keyframe::new(100.0, Transform::new(0.0, 0.0, 50.0, 50.0, 370.0)),
    ];
    approx(sample(50.0, &keys).unwrap().rotation, 190.0);
}

#[test]
fn degenerate_pair_prefers_earlier() {
    let keys = [kf(30.0, 1.0), kf(30.0, 2.0)];
    // Both are `<= 30`, so the later one is `before` and there is no `after`.
    assert_eq!(sample(30.0, &keys).unwrap().x, 2.0);
    assert_eq!(sample(10.0, &keys).unwrap().x, 1.0);
}

#[test]
fn lerp_endpoints_are_exact() {
    let a = Transform::new(1.0, 2.0, 3.0, 4.0, 5.0);
    let b = Transform::new(10.0, 20.0, 30.0, 40.0, 50.0);
    assert_eq!(Transform::lerp(&a, &b, 0.0), a);
    assert_eq!(Transform::lerp(&a, &b, 1.0), b);
}

#[test]
fn snap_uses_its_own_tolerance() {
    let keys = [kf(20.0, 1.0), kf(60.0, 2.0)];
    assert_eq!(snap_exact(20.4, &keys).unwrap().x, 1.0);
    assert_eq!(snap_exact(19.6, &keys).unwrap().x, 1.0);
    // Within the coalescing epsilon but outside the snap window.
    assert_eq!(snap_exact(20.7, &keys), None);
    assert_eq!(snap_exact(40.0, &keys), None);
}

#[test]
fn batch_sampling_honors_editing_flag() {
    let mut store = KeyframeStore::new();
    let moving = AssetId::new("moving");
    let typing = AssetId::new("typing");
    for id in [&moving, &typing] {
        store
            .upsert(id, 0.0, Transform::new(0.0, 0.0, 200.0, 50.0, 0.0))
            .unwrap();
        store
            .upsert(id, 100.0, Transform::new(100.0, 0.0, 200.0, 50.0, 0.0))
            .unwrap();
    }

    let mut assets = vec![
        Asset::text(moving, TextStyle::default()),
        Asset::text(typing, TextStyle::default()),
    ];
    assets[0].edit.set(false);
    let before = assets[1].transform;

    let report = sample_assets(50.0, &mut assets, &store, SkipPolicy::HonorEditing);
    assert_eq!(report, SampleReport { updated: 1, skipped: 1 });
    approx(assets[0].transform.x, 50.0);
    assert_eq!(assets[1].transform, before);

    let report = sample_assets(50.0, &mut assets, &store, SkipPolicy::IgnoreEditing);
    assert_eq!(report.updated, 2);
    approx(assets[1].transform.x, 50.0);
}

#[test]
fn batch_sampling_leaves_unkeyed_assets_alone() {
    let store = KeyframeStore::new();
    let mut assets = vec![Asset::image(
        AssetId::new("img"),
        "a.png",
        crate::foundation::core::Canvas::REFERENCE,
    )];
    let before = assets[0].transform;
    let report = sample_assets(10.0, &mut assets, &store, SkipPolicy::HonorEditing);
    assert_eq!(report, SampleReport::default());
    assert_eq!(assets[0].transform, before);
}
