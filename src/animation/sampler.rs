use crate::animation::keyframe::{Keyframe, KeyframeStore};
use crate::foundation::core::Transform;
use crate::scene::asset::Asset;

/// Exact-match window used when a seek lands near a keyframe while paused.
///
/// Independent of [`COALESCE_EPSILON`](crate::animation::keyframe::COALESCE_EPSILON).
pub const SNAP_TOLERANCE: f64 = 0.5;

/// Linear interpolation between two values of the same type.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` at `t` (`t = 0` yields `a`, `t = 1` yields `b`).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Transform {
    // Rotation is a plain scalar: 10 -> 370 spins a full turn.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            x: f64::lerp(&a.x, &b.x, t),
            y: f64::lerp(&a.y, &b.y, t),
            width: f64::lerp(&a.width, &b.width, t),
            height: f64::lerp(&a.height, &b.height, t),
            rotation: f64::lerp(&a.rotation, &b.rotation, t),
        }
    }
}

/// Reconstruct the transform at `time` from an ascending keyframe sequence.
///
/// Returns `None` for an empty sequence; the caller keeps the asset's current transform.
/// Outside the keyed range the nearest keyframe is held.
pub fn sample(time: f64, keyframes: &[Keyframe]) -> Option<Transform> {
    // First index with `k.time > time`.
    let split = keyframes.partition_point(|k| k.time <= time);
    let before = split.checked_sub(1).map(|i| &keyframes[i]);
    let after = keyframes.get(split);

    match (before, after) {
        (None, None) => None,
        (None, Some(a)) => Some(a.transform),
        (Some(b), None) => Some(b.transform),
        (Some(b), Some(a)) => {
            let span = a.time - b.time;
            if span <= 0.0 {
                tracing::trace!(time = b.time, "degenerate keyframe pair, holding earlier");
                return Some(b.transform);
            }
            let t = (time - b.time) / span;
            Some(Transform::lerp(&b.transform, &a.transform, t))
        }
    }
}

/// Transform of the first keyframe within [`SNAP_TOLERANCE`] of `time`, if any.
pub fn snap_exact(time: f64, keyframes: &[Keyframe]) -> Option<Transform> {
    keyframes
        .iter()
        .find(|k| (k.time - time).abs() < SNAP_TOLERANCE)
        .map(|k| k.transform)
}

/// Whether a batch sampling pass leaves assets in editing mode alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Skip assets with `hold_sampling` set (live playback).
    HonorEditing,
    /// Sample every asset (export).
    IgnoreEditing,
}

/// Counts reported by [`sample_assets`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleReport {
    /// Assets whose transform was written.
    pub updated: usize,
    /// Assets left alone because they are being edited.
    pub skipped: usize,
}

/// Sample every asset at `time` and commit the results.
///
/// Assets without keyframes keep their current transform and are not counted.
pub fn sample_assets(
    time: f64,
    assets: &mut [Asset],
    store: &KeyframeStore,
    policy: SkipPolicy,
) -> SampleReport {
    let mut report = SampleReport::default();
    for asset in assets.iter_mut() {
        if policy == SkipPolicy::HonorEditing && asset.edit.hold_sampling {
            report.skipped += 1;
            continue;
        }
        if let Some(t) = sample(time, store.get(&asset.id)) {
            asset.transform = t;
            report.updated += 1;
        }
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/animation/sampler.rs"]
mod tests;
