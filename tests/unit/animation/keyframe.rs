use super::*;

fn id(s: &str) -> AssetId {
    AssetId::new(s)
}

fn at(x: f64) -> Transform {
    Transform::new(x, 0.0, 100.0, 100.0, 0.0)
}

#[test]
fn upsert_keeps_track_sorted() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    store.upsert(&a, 50.0, at(5.0)).unwrap();
    store.upsert(&a, 10.0, at(1.0)).unwrap();
    store.upsert(&a, 90.0, at(9.0)).unwrap();
    store.upsert(&a, 30.0, at(3.0)).unwrap();

    let times: Vec<f64> = store.get(&a).iter().map(|k| k.time).collect();
    assert_eq!(times, vec![10.0, 30.0, 50.0, 90.0]);
}

#[test]
fn upsert_within_epsilon_overwrites_transform() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    assert_eq!(
        store.upsert(&a, 30.0, at(1.0)).unwrap(),
        UpsertOutcome::Inserted(0)
    );
    assert_eq!(
        store.upsert(&a, 30.4, at(2.0)).unwrap(),
        UpsertOutcome::Updated(0)
    );

    let track = store.get(&a);
    assert_eq!(track.len(), 1);
    assert_eq!(track[0].time, 30.0);
    assert_eq!(track[0].transform.x, 2.0);
}

#[test]
fn upsert_at_exactly_epsilon_inserts() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    store.upsert(&a, 30.0, at(1.0)).unwrap();
    assert_eq!(
        store.upsert(&a, 31.0, at(2.0)).unwrap(),
        UpsertOutcome::Inserted(1)
    );
    assert_eq!(store.get(&a).len(), 2);
}

#[test]
fn upsert_coalesces_into_nearest_neighbour() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    store.upsert(&a, 10.0, at(1.0)).unwrap();
    store.upsert(&a, 11.5, at(2.0)).unwrap();

    assert_eq!(
        store.upsert(&a, 10.9, at(7.0)).unwrap(),
        UpsertOutcome::Updated(1)
    );
    let track = store.get(&a);
    assert_eq!(track.len(), 2);
    assert_eq!(track[0].transform.x, 1.0);
    assert_eq!(track[1].time, 11.5);
    assert_eq!(track[1].transform.x, 7.0);
}

#[test]
fn tracks_are_independent_per_asset() {
    let mut store = KeyframeStore::new();
    store.upsert(&id("a"), 20.0, at(1.0)).unwrap();
    store.upsert(&id("b"), 20.2, at(2.0)).unwrap();

    assert_eq!(store.get(&id("a")).len(), 1);
    assert_eq!(store.get(&id("b")).len(), 1);
    assert_eq!(store.total_keyframes(), 2);
    assert!(store.get(&id("missing")).is_empty());
}

#[test]
fn upsert_clamps_time_and_rejects_non_finite() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    store.upsert(&a, 140.0, at(1.0)).unwrap();
    assert_eq!(store.get(&a)[0].time, 100.0);

    assert!(store.upsert(&a, f64::NAN, at(1.0)).is_err());
    let bad = Transform::new(f64::INFINITY, 0.0, 40.0, 40.0, 0.0);
    assert!(store.upsert(&a, 20.0, bad).is_err());
    assert_eq!(store.total_keyframes(), 1);
}

#[test]
fn upsert_raises_undersized_transforms_to_minimum() {
    let mut store = KeyframeStore::new();
    let a = id("a");
    store
        .upsert(&a, 0.0, Transform::new(3.0, 4.0, 10.0, 5.0, 0.0))
        .unwrap();
    store.upsert(&a, 50.0, at(0.0)).unwrap();
    store
        .upsert(&a, 50.3, Transform::new(0.0, 0.0, 120.0, 1.0, 0.0))
        .unwrap();

    let track = store.get(&a);
    assert_eq!(track[0].transform, Transform::new(3.0, 4.0, 40.0, 40.0, 0.0));
    assert_eq!(track[1].transform.width, 120.0);
    assert_eq!(track[1].transform.height, 40.0);
}

#[test]
fn max_time_spans_all_assets() {
    let mut store = KeyframeStore::new();
    assert_eq!(store.max_time(), None);
    assert!(store.is_empty());

    store.upsert(&id("a"), 0.0, at(0.0)).unwrap();
    store.upsert(&id("a"), 40.0, at(0.0)).unwrap();
    store.upsert(&id("b"), 75.0, at(0.0)).unwrap();
    assert_eq!(store.max_time(), Some(75.0));
    assert!(!store.is_empty());
}

#[test]
fn remove_asset_drops_its_track() {
    let mut store = KeyframeStore::new();
    store.upsert(&id("a"), 5.0, at(0.0)).unwrap();
    assert_eq!(store.remove_asset(&id("a")).map(|k| k.len()), Some(1));
    assert!(store.is_empty());
    assert_eq!(store.asset_ids().count(), 0);
}

#[test]
fn keyframe_serializes_flat() {
    let k = Keyframe::new(12.5, Transform::new(1.0, 2.0, 40.0, 50.0, 90.0));
    let v = serde_json::to_value(k).unwrap();
    assert_eq!(v["time"], 12.5);
    assert_eq!(v["width"], 40.0);
    assert_eq!(v["rotation"], 90.0);
}
