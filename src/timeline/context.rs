use crate::animation::keyframe::{KeyframeStore, UpsertOutcome};
use crate::animation::sampler::{SampleReport, snap_exact};
use crate::foundation::core::{Canvas, Transform, clamp_time};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::scene::asset::{Asset, AssetId, AssetKind};
use crate::scene::color::Color;

/// Whether the playback clock is advancing the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Clock idle; position only moves on seek/scrub.
    #[default]
    Stopped,
    /// Clock advancing on every tick.
    Playing,
}

/// Which writer currently owns the timeline position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeDriver {
    /// Nobody; programmatic seeks may write.
    #[default]
    Idle,
    /// The playback clock.
    Playback,
    /// A pointer drag on the timeline widget.
    Scrub,
    /// An export in progress; every other writer is refused.
    Export,
}

/// Static scene description: canvas, background and assets in z-order.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Interactive canvas size.
    pub canvas: Canvas,
    /// Background fill.
    pub background: Color,
    /// Assets, back to front.
    pub assets: Vec<Asset>,
}

impl Scene {
    /// Background of a fresh project.
    pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x0f, 0x17, 0x2a);

    /// Empty scene on `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            background: Self::DEFAULT_BACKGROUND,
            assets: Vec::new(),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

/// Explicit engine state shared by the clock, the scrub controller and the export driver.
///
/// All writers go through `&mut EditorContext`; [`TimeDriver`] records which one currently owns
/// the timeline position.
#[derive(Clone, Debug, Default)]
pub struct EditorContext {
    scene: Scene,
    keyframes: KeyframeStore,
    position: f64,
    playback: PlaybackState,
    driver: TimeDriver,
}

impl EditorContext {
    /// Context over `scene` with no keyframes, at position 0.
    pub fn new(scene: Scene) -> Self {
        Self::with_keyframes(scene, KeyframeStore::new())
    }

    /// Context over `scene` and an existing keyframe store.
    pub fn with_keyframes(scene: Scene, keyframes: KeyframeStore) -> Self {
        Self {
            scene,
            keyframes,
            position: 0.0,
            playback: PlaybackState::Stopped,
            driver: TimeDriver::Idle,
        }
    }

    /// Borrow the scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Assets in z-order.
    pub fn assets(&self) -> &[Asset] {
        &self.scene.assets
    }

    /// Look up one asset.
    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.scene.assets.iter().find(|a| &a.id == id)
    }

    /// Borrow the keyframe store.
    pub fn keyframes(&self) -> &KeyframeStore {
        &self.keyframes
    }

    /// Current timeline position in `[0, 100]`.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current playback state.
    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Current timeline owner.
    pub fn driver(&self) -> TimeDriver {
        self.driver
    }

    /// Return `true` while the clock is advancing.
    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    /// Replace an asset's transform directly (gesture layer). Width/height are raised to the
    /// minimum size; the sampler is bypassed.
    pub fn set_transform(&mut self, id: &AssetId, transform: Transform) -> EasyAnimResult<()> {
        transform.validate()?;
        self.asset_mut(id)?.transform = transform.with_min_size();
        Ok(())
    }

    /// Pin the asset's current transform at the current position.
    pub fn add_or_update_keyframe(&mut self, id: &AssetId) -> EasyAnimResult<UpsertOutcome> {
        let transform = self
            .asset(id)
            .map(|a| a.transform)
            .ok_or_else(|| EasyAnimError::UnknownAsset(id.clone()))?;
        let time = self.position;
        self.keyframes.upsert(id, time, transform)
    }

    /// Pin `transform` for asset `id` at `time`.
    pub fn add_or_update_keyframe_at(
        &mut self,
        id: &AssetId,
        time: f64,
        transform: Transform,
    ) -> EasyAnimResult<UpsertOutcome> {
        if self.asset(id).is_none() {
            return Err(EasyAnimError::UnknownAsset(id.clone()));
        }
        self.keyframes.upsert(id, time, transform)
    }

    /// Enter or leave editing mode for one asset.
    pub fn set_editing(&mut self, id: &AssetId, editing: bool) -> EasyAnimResult<()> {
        self.asset_mut(id)?.edit.set(editing);
        Ok(())
    }

    /// Append an asset on top of the z-order.
    pub fn add_asset(&mut self, asset: Asset) -> EasyAnimResult<()> {
        asset.transform.validate()?;
        if self.asset(&asset.id).is_some() {
            return Err(EasyAnimError::validation(format!(
                "duplicate asset id '{}'",
                asset.id
            )));
        }
        let mut asset = asset;
        asset.transform = asset.transform.with_min_size();
        self.scene.assets.push(asset);
        Ok(())
    }

    /// Remove an asset together with its keyframes.
    pub fn remove_asset(&mut self, id: &AssetId) -> EasyAnimResult<Asset> {
        let idx = self
            .scene
            .assets
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| EasyAnimError::UnknownAsset(id.clone()))?;
        self.keyframes.remove_asset(id);
        Ok(self.scene.assets.remove(idx))
    }

    /// Replace the content of a text asset.
    pub fn set_text(&mut self, id: &AssetId, content: impl Into<String>) -> EasyAnimResult<()> {
        match &mut self.asset_mut(id)?.kind {
            AssetKind::Text { text, .. } => {
                *text = content.into();
                Ok(())
            }
            AssetKind::Image { .. } => Err(EasyAnimError::validation(format!(
                "asset '{id}' is not a text asset"
            ))),
        }
    }

    /// Move the timeline position programmatically.
    ///
    /// While paused, assets whose keyframe lies within the snap window take that keyframe's
    /// transform; all others stay where they are.
    pub fn seek(&mut self, time: f64) -> EasyAnimResult<SampleReport> {
        if self.driver == TimeDriver::Export {
            return Err(EasyAnimError::busy("cannot seek while exporting"));
        }
        if !time.is_finite() {
            return Err(EasyAnimError::validation("seek time must be finite"));
        }
        Ok(self.move_to(time))
    }

    /// Take ownership of the timeline for `driver`. The most recent writer wins, except that an
    /// export cannot be preempted.
    pub(crate) fn acquire(&mut self, driver: TimeDriver) -> EasyAnimResult<()> {
        if self.driver == TimeDriver::Export && driver != TimeDriver::Export {
            return Err(EasyAnimError::busy("export in progress"));
        }
        if driver == TimeDriver::Scrub && self.is_playing() {
            tracing::debug!("scrub pauses playback");
            self.playback = PlaybackState::Stopped;
        }
        self.driver = driver;
        Ok(())
    }

    /// Give ownership back if `driver` still holds it.
    pub(crate) fn release(&mut self, driver: TimeDriver) {
        if self.driver == driver {
            self.driver = TimeDriver::Idle;
        }
    }

    /// Set position and, when paused, apply snap resolution.
    pub(crate) fn move_to(&mut self, time: f64) -> SampleReport {
        self.position = clamp_time(time);
        if self.is_playing() {
            SampleReport::default()
        } else {
            self.resolve_snaps()
        }
    }

    pub(crate) fn set_position(&mut self, time: f64) {
        self.position = clamp_time(time);
    }

    pub(crate) fn set_playback(&mut self, state: PlaybackState) {
        self.playback = state;
    }

    pub(crate) fn restore_driver(&mut self, driver: TimeDriver) {
        self.driver = driver;
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Asset], &KeyframeStore) {
        (&mut self.scene.assets, &self.keyframes)
    }

    /// Snap-or-ignore pass: never interpolates.
    pub(crate) fn resolve_snaps(&mut self) -> SampleReport {
        let mut report = SampleReport::default();
        for asset in &mut self.scene.assets {
            if asset.edit.hold_sampling {
                report.skipped += 1;
                continue;
            }
            if let Some(t) = snap_exact(self.position, self.keyframes.get(&asset.id)) {
                asset.transform = t;
                report.updated += 1;
            }
        }
        report
    }

    fn asset_mut(&mut self, id: &AssetId) -> EasyAnimResult<&mut Asset> {
        self.scene
            .assets
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| EasyAnimError::UnknownAsset(id.clone()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/context.rs"]
mod tests;
