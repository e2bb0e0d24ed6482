use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::render::backend::FrameRGBA;

/// Container of an encoded byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// WebM (VP8/VP9).
    WebM,
    /// Fragmented MP4 (H.264/MPEG-4 Part 2).
    Mp4,
    /// Concatenated premultiplied RGBA8 frames, no container.
    RawRgba,
}

impl VideoFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
            Self::RawRgba => "rgba",
        }
    }

    /// MIME type of the container.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebM => "video/webm",
            Self::Mp4 => "video/mp4",
            Self::RawRgba => "application/octet-stream",
        }
    }

    /// Whether the encoder needs even width and height (yuv420p chroma subsampling).
    pub fn requires_even_dimensions(self) -> bool {
        !matches!(self, Self::RawRgba)
    }
}

/// Configuration provided to a [`FrameSink`] at the start of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Call order: `negotiate`, `begin`, `push_frame`*, `end`. `negotiate` runs before any frame is
/// rendered so an unusable encoder fails the export up front. `push_frame` is called in strictly
/// increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Pick an encoder and report the container it produces.
    ///
    /// Fails with [`EasyAnimError::UnsupportedEncoder`] when nothing usable is available.
    fn negotiate(&mut self) -> EasyAnimResult<VideoFormat>;
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> EasyAnimResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EasyAnimResult<()>;
    /// Called once after the last frame is pushed; returns the encoded stream.
    fn end(&mut self) -> EasyAnimResult<Vec<u8>>;
    /// Release resources after a failed export. Default: nothing to release.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging. `end` returns the raw frames back to back.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in timeline order.
    pub(crate) frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn negotiate(&mut self) -> EasyAnimResult<VideoFormat> {
        Ok(VideoFormat::RawRgba)
    }

    fn begin(&mut self, cfg: SinkConfig) -> EasyAnimResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EasyAnimResult<()> {
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(EasyAnimError::evaluation(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> EasyAnimResult<Vec<u8>> {
        Ok(self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect())
    }
}
