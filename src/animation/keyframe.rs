use std::collections::BTreeMap;

use crate::foundation::core::{Transform, clamp_time};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::scene::asset::AssetId;

/// Two keyframes closer than this (in timeline percent) are the same keyframe.
pub const COALESCE_EPSILON: f64 = 1.0;

/// A transform pinned to a timeline position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Timeline position in `[0, 100]`.
    pub time: f64,
    /// Full transform snapshot at `time`.
    #[serde(flatten)]
    pub transform: Transform,
}

impl Keyframe {
    /// Build a keyframe.
    pub fn new(time: f64, transform: Transform) -> Self {
        Self { time, transform }
    }
}

/// Result of [`KeyframeStore::upsert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new keyframe was inserted at this index.
    Inserted(usize),
    /// The keyframe at this index was overwritten in place.
    Updated(usize),
}

/// Per-asset keyframe sequences, each sorted ascending by time.
///
/// Invariant: within one asset no two keyframes are closer than [`COALESCE_EPSILON`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframeStore {
    tracks: BTreeMap<AssetId, Vec<Keyframe>>,
}

impl KeyframeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe, or overwrite the transform of the nearest one within
    /// [`COALESCE_EPSILON`] of `time`.
    ///
    /// An overwritten keyframe keeps its original time, so coalescing can never move it within
    /// epsilon of a neighbour. Width and height are raised to the minimum asset size before
    /// storing.
    pub fn upsert(
        &mut self,
        asset: &AssetId,
        time: f64,
        transform: Transform,
    ) -> EasyAnimResult<UpsertOutcome> {
        if !time.is_finite() {
            return Err(EasyAnimError::animation("keyframe time must be finite"));
        }
        transform.validate()?;
        let transform = transform.with_min_size();
        let time = clamp_time(time);

        let track = self.tracks.entry(asset.clone()).or_default();
        let nearest = track
            .iter()
            .enumerate()
            .map(|(i, k)| (i, (k.time - time).abs()))
            .filter(|&(_, d)| d < COALESCE_EPSILON)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((idx, _)) = nearest {
            track[idx].transform = transform;
            tracing::debug!(asset = %asset, time, at = track[idx].time, "keyframe updated");
            return Ok(UpsertOutcome::Updated(idx));
        }

        let idx = track.partition_point(|k| k.time <= time);
        track.insert(idx, Keyframe::new(time, transform));
        tracing::debug!(asset = %asset, time, idx, "keyframe inserted");
        Ok(UpsertOutcome::Inserted(idx))
    }

    /// Keyframes of `asset`, ascending by time (empty if none).
    pub fn get(&self, asset: &AssetId) -> &[Keyframe] {
        self.tracks.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop every keyframe of `asset`.
    pub fn remove_asset(&mut self, asset: &AssetId) -> Option<Vec<Keyframe>> {
        self.tracks.remove(asset)
    }

    /// Iterate `(asset, keyframes)` pairs in asset-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &[Keyframe])> {
        self.tracks.iter().map(|(id, k)| (id, k.as_slice()))
    }

    /// Ids of assets with at least one keyframe.
    pub fn asset_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.tracks.keys()
    }

    /// Return `true` when no asset has a keyframe.
    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(Vec::is_empty)
    }

    /// Number of keyframes across all assets.
    pub fn total_keyframes(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    /// Largest keyframe time across all assets, if any.
    pub fn max_time(&self) -> Option<f64> {
        self.tracks
            .values()
            .filter_map(|k| k.last())
            .map(|k| k.time)
            .max_by(f64::total_cmp)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
