//! easyanim is a keyframe animation engine for placed images and text.
//!
//! Assets carry a transform (position, size, rotation). Keyframes pin transforms to a
//! normalized 0 to 100 timeline; the sampler reconstructs transforms in between by linear
//! interpolation. The public API is context-oriented:
//!
//! - Build an [`EditorContext`] from a [`Scene`] or load a [`Project`]
//! - Record keyframes and drive time with [`PlaybackClock`], [`ScrubController`] or
//!   [`EditorContext::seek`]
//! - Render single frames with [`render_frame`] or export the whole animation into a
//!   [`FrameSink`] with [`ExportDriver`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
/// Encoding sinks.
pub mod encode;
pub(crate) mod export;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, MIN_ASSET_SIZE, Point, Rect, TIMELINE_END,
    TIMELINE_START, Transform, Vec2, clamp_time,
};
pub use crate::foundation::error::{EasyAnimError, EasyAnimResult};

pub use crate::animation::keyframe::{COALESCE_EPSILON, Keyframe, KeyframeStore, UpsertOutcome};
pub use crate::animation::sampler::{
    Lerp, SNAP_TOLERANCE, SampleReport, SkipPolicy, sample, sample_assets, snap_exact,
};
pub use crate::assets::fonts::FontBook;
pub use crate::assets::store::{
    AssetLoadFailure, PreparedAssetStore, PreparedImage, PreparedText,
};
pub use crate::encode::ffmpeg::{
    FFMPEG_ENV, FfmpegSink, FfmpegSinkOpts, VideoCodec, is_ffmpeg_on_path, pick_codec,
};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, VideoFormat};
pub use crate::export::driver::{
    EXPORT_FPS_ENV, ExportArtifact, ExportDriver, ExportOpts, export_end_time,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::cpu::{CpuSurface, text_size_for_height};
pub use crate::render::pipeline::{
    AssetGeometry, DrawPayload, DrawSurface, RenderReport, render_assets, render_frame,
};
pub use crate::scene::asset::{Asset, AssetId, AssetKind, EditState, TextStyle};
pub use crate::scene::color::Color;
pub use crate::scene::project::Project;
pub use crate::timeline::clock::{ClockOpts, PlaybackClock, TickOutcome};
pub use crate::timeline::context::{EditorContext, PlaybackState, Scene, TimeDriver};
pub use crate::timeline::scrub::{ScrubController, time_at};
pub use crate::timeline::widget::{TimelineMarkers, format_time, markers, x_for_time};
