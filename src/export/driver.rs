use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

use crate::animation::keyframe::KeyframeStore;
use crate::animation::sampler::{SkipPolicy, sample_assets};
use crate::assets::fonts::FontBook;
use crate::assets::store::{AssetLoadFailure, PreparedAssetStore};
use crate::encode::sink::{FrameSink, SinkConfig, VideoFormat};
use crate::foundation::core::{Canvas, Fps, FrameIndex, TIMELINE_END};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::render::cpu::CpuSurface;
use crate::render::pipeline::{DrawSurface, render_assets};
use crate::timeline::context::{EditorContext, PlaybackState, TimeDriver};

/// Environment variable overriding the export frame rate (integer fps).
pub const EXPORT_FPS_ENV: &str = "EASYANIM_EXPORT_FPS";

/// Slack on the end-time comparison for fractional steps.
const END_TOLERANCE: f64 = 1e-9;

/// Options controlling [`ExportDriver::run`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOpts {
    /// Offscreen canvas size. Assets are not rescaled when it differs from the scene canvas.
    pub canvas: Canvas,
    /// Frame rate announced to the sink.
    pub fps: Fps,
    /// Timeline percent between two exported frames.
    pub time_step: f64,
    /// Override the number of rayon worker threads used for preloading. `None` uses rayon
    /// defaults.
    pub threads: Option<usize>,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::REFERENCE,
            fps: Fps { num: 30, den: 1 },
            time_step: 0.5,
            threads: None,
        }
    }
}

impl ExportOpts {
    /// Defaults, with the frame rate taken from `EASYANIM_EXPORT_FPS` when set and valid.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(raw) = std::env::var(EXPORT_FPS_ENV) {
            match raw.trim().parse::<u32>().ok().and_then(|n| Fps::new(n, 1).ok()) {
                Some(fps) => opts.fps = fps,
                None => tracing::warn!(value = %raw, "ignoring invalid {EXPORT_FPS_ENV}"),
            }
        }
        opts
    }

    /// Reject unusable option combinations.
    pub fn validate(&self) -> EasyAnimResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(EasyAnimError::validation(
                "export time_step must be finite and > 0",
            ));
        }
        if self.threads == Some(0) {
            return Err(EasyAnimError::validation(
                "export 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Result of a finished export.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    /// Encoded stream as returned by the sink.
    pub bytes: Vec<u8>,
    /// Container of `bytes`.
    pub format: VideoFormat,
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Timeline position of the last frame.
    pub end_time: f64,
    /// Assets that rendered as empty slots because their payload failed to load.
    pub load_failures: Vec<AssetLoadFailure>,
}

impl ExportArtifact {
    /// `animation-<unix millis>.<ext>`.
    pub fn suggested_file_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        format!("animation-{millis}.{}", self.format.extension())
    }

    /// Write the encoded bytes to `path`.
    pub fn save(&self, path: &Path) -> EasyAnimResult<()> {
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write export to {}", path.display()))?;
        Ok(())
    }
}

/// Last frame time of an export: the latest keyframe, or the full timeline when every
/// keyframe sits at 0.
pub fn export_end_time(keyframes: &KeyframeStore) -> f64 {
    match keyframes.max_time() {
        Some(t) if t > 0.0 => t,
        _ => TIMELINE_END,
    }
}

/// Deterministic offline walk of the timeline into a [`FrameSink`].
#[derive(Clone, Debug, Default)]
pub struct ExportDriver {
    opts: ExportOpts,
    fonts: Option<FontBook>,
}

impl ExportDriver {
    /// Create a driver. Fonts are loaded from the assets root on each run unless
    /// [`ExportDriver::with_fonts`] provides them.
    pub fn new(opts: ExportOpts) -> Self {
        Self { opts, fonts: None }
    }

    /// Reuse an already loaded font book.
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = Some(fonts);
        self
    }

    /// Options in effect.
    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Export the whole animation of `ctx` into `sink`.
    ///
    /// Preconditions fail before the timeline is touched. Once frames start, position,
    /// playback state and timeline owner are restored whether the export succeeds or not.
    #[tracing::instrument(skip_all, fields(assets = ctx.assets().len(), root = %assets_root.display()))]
    pub fn run(
        &self,
        ctx: &mut EditorContext,
        assets_root: &Path,
        sink: &mut dyn FrameSink,
    ) -> EasyAnimResult<ExportArtifact> {
        if ctx.keyframes().is_empty() {
            return Err(EasyAnimError::EmptyAnimation);
        }
        if ctx.driver() == TimeDriver::Export {
            return Err(EasyAnimError::busy("an export is already running"));
        }
        self.opts.validate()?;

        let format = sink.negotiate()?;
        tracing::debug!(format = format.extension(), "sink negotiated");
        let canvas = self.opts.canvas;
        let odd = canvas.width % 2 != 0 || canvas.height % 2 != 0;
        if format.requires_even_dimensions() && odd {
            return Err(EasyAnimError::validation(format!(
                "{} export needs even canvas dimensions, got {}x{}",
                format.extension(),
                canvas.width,
                canvas.height
            )));
        }

        let prepared = self.preload(ctx, assets_root)?;
        let end_time = export_end_time(ctx.keyframes());
        if ctx.scene().canvas != self.opts.canvas {
            tracing::warn!(
                scene_w = ctx.scene().canvas.width,
                scene_h = ctx.scene().canvas.height,
                export_w = self.opts.canvas.width,
                export_h = self.opts.canvas.height,
                "scene canvas differs from export canvas; assets are not rescaled"
            );
        }

        let saved_position = ctx.position();
        let saved_playback = ctx.playback();
        let saved_driver = ctx.driver();
        ctx.acquire(TimeDriver::Export)?;
        ctx.set_playback(PlaybackState::Stopped);

        let res = self.render_all(ctx, &prepared, end_time, sink);

        ctx.set_position(saved_position);
        ctx.set_playback(saved_playback);
        ctx.restore_driver(saved_driver);

        let (frames, bytes) = match res {
            Ok(v) => v,
            Err(e) => {
                sink.abort();
                return Err(e);
            }
        };
        tracing::info!(frames, end_time, bytes = bytes.len(), "export finished");

        Ok(ExportArtifact {
            bytes,
            format,
            frames,
            end_time,
            load_failures: prepared.failures().to_vec(),
        })
    }

    fn preload(
        &self,
        ctx: &EditorContext,
        assets_root: &Path,
    ) -> EasyAnimResult<PreparedAssetStore> {
        let loaded;
        let fonts = match &self.fonts {
            Some(f) => f,
            None => {
                loaded = FontBook::load(assets_root);
                &loaded
            }
        };
        match self.opts.threads {
            None => Ok(PreparedAssetStore::prepare(assets_root, ctx.assets(), fonts)),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        EasyAnimError::evaluation(format!("failed to build rayon thread pool: {e}"))
                    })?;
                Ok(pool.install(|| PreparedAssetStore::prepare(assets_root, ctx.assets(), fonts)))
            }
        }
    }

    fn render_all(
        &self,
        ctx: &mut EditorContext,
        prepared: &PreparedAssetStore,
        end_time: f64,
        sink: &mut dyn FrameSink,
    ) -> EasyAnimResult<(u64, Vec<u8>)> {
        let mut surface = CpuSurface::new(self.opts.canvas)?;
        let mut scratch = ctx.assets().to_vec();
        let background = ctx.scene().background;

        sink.begin(SinkConfig {
            width: self.opts.canvas.width,
            height: self.opts.canvas.height,
            fps: self.opts.fps,
        })?;

        let mut i: u64 = 0;
        loop {
            let t = i as f64 * self.opts.time_step;
            if t > end_time + END_TOLERANCE {
                break;
            }
            ctx.set_position(t);
            sample_assets(
                ctx.position(),
                &mut scratch,
                ctx.keyframes(),
                SkipPolicy::IgnoreEditing,
            );

            surface.clear(background)?;
            render_assets(&scratch, prepared, &mut surface)?;
            let frame = surface.finish()?;
            sink.push_frame(FrameIndex(i), &frame)?;
            i += 1;
        }

        let bytes = sink.end()?;
        Ok((i, bytes))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/driver.rs"]
mod tests;
