use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig, VideoFormat};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Environment variable overriding the `ffmpeg` binary.
pub const FFMPEG_ENV: &str = "EASYANIM_FFMPEG";

/// Video encoders the sink knows how to drive, in the container each one writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP9 in WebM (`libvpx-vp9`).
    Vp9,
    /// VP8 in WebM (`libvpx`).
    Vp8,
    /// H.264 in fragmented MP4 (`libx264`).
    H264,
    /// MPEG-4 Part 2 in fragmented MP4 (`mpeg4`).
    Mpeg4,
}

impl VideoCodec {
    /// Default preference order: WebM first, MP4 as fallback.
    pub const PREFERENCE: [VideoCodec; 4] = [Self::Vp9, Self::Vp8, Self::H264, Self::Mpeg4];

    /// Encoder name as listed by `ffmpeg -encoders`.
    pub fn encoder(self) -> &'static str {
        match self {
            Self::Vp9 => "libvpx-vp9",
            Self::Vp8 => "libvpx",
            Self::H264 => "libx264",
            Self::Mpeg4 => "mpeg4",
        }
    }

    /// Container produced with this encoder.
    pub fn format(self) -> VideoFormat {
        match self {
            Self::Vp9 | Self::Vp8 => VideoFormat::WebM,
            Self::H264 | Self::Mpeg4 => VideoFormat::Mp4,
        }
    }

    fn output_args(self, crf: u8) -> Vec<String> {
        let crf = crf.to_string();
        let codec: &[&str] = match self {
            Self::Vp9 => &["-crf", crf.as_str(), "-b:v", "0"],
            Self::Vp8 => &["-crf", crf.as_str(), "-b:v", "2M"],
            Self::H264 => &["-crf", crf.as_str()],
            Self::Mpeg4 => &["-q:v", "4"],
        };
        let container: &[&str] = match self.format() {
            VideoFormat::Mp4 => &["-movflags", "frag_keyframe+empty_moov", "-f", "mp4"],
            VideoFormat::WebM | VideoFormat::RawRgba => &["-f", "webm"],
        };
        ["-c:v", self.encoder(), "-pix_fmt", "yuv420p"]
            .iter()
            .chain(codec)
            .chain(container)
            .map(|s| (*s).to_owned())
            .collect()
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// `ffmpeg` binary to run.
    pub ffmpeg: PathBuf,
    /// Encoders to try, most preferred first.
    pub codecs: Vec<VideoCodec>,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Constant rate factor for encoders that take one.
    pub crf: u8,
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            codecs: VideoCodec::PREFERENCE.to_vec(),
            bg_rgba: [0, 0, 0, 255],
            crf: 30,
        }
    }
}

impl FfmpegSinkOpts {
    /// Defaults with the binary taken from `EASYANIM_FFMPEG` when set.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(bin) = std::env::var_os(FFMPEG_ENV).filter(|v| !v.is_empty()) {
            opts.ffmpeg = PathBuf::from(bin);
        }
        opts
    }
}

/// Sink that spawns `ffmpeg`, streams raw frames to stdin and collects the container from stdout.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    codec: Option<VideoCodec>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("codec", &self.codec)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            codec: None,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Encoder chosen by [`FrameSink::negotiate`], if negotiation ran.
    pub fn codec(&self) -> Option<VideoCodec> {
        self.codec
    }

    fn list_encoders(&self) -> EasyAnimResult<String> {
        let out = Command::new(&self.opts.ffmpeg)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                EasyAnimError::unsupported_encoder(format!(
                    "cannot run '{}' (is ffmpeg installed?): {e}",
                    self.opts.ffmpeg.display()
                ))
            })?;
        if !out.status.success() {
            return Err(EasyAnimError::unsupported_encoder(format!(
                "'{} -encoders' exited with status {}",
                self.opts.ffmpeg.display(),
                out.status
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl FrameSink for FfmpegSink {
    fn negotiate(&mut self) -> EasyAnimResult<VideoFormat> {
        let listing = self.list_encoders()?;
        let codec = pick_codec(&self.opts.codecs, &listing).ok_or_else(|| {
            let wanted: Vec<&str> = self.opts.codecs.iter().map(|c| c.encoder()).collect();
            EasyAnimError::unsupported_encoder(format!(
                "none of [{}] is available in ffmpeg",
                wanted.join(", ")
            ))
        })?;
        tracing::debug!(encoder = codec.encoder(), "negotiated video encoder");
        self.codec = Some(codec);
        Ok(codec.format())
    }

    fn begin(&mut self, cfg: SinkConfig) -> EasyAnimResult<()> {
        let codec = match self.codec {
            Some(c) => c,
            None => {
                self.negotiate()?;
                self.codec
                    .ok_or_else(|| EasyAnimError::unsupported_encoder("no encoder negotiated"))?
            }
        };
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(EasyAnimError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(EasyAnimError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(EasyAnimError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames. `ffmpeg` does not understand premul, so we flatten alpha
        // before writing to stdin (push_frame).
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        cmd.args(codec.output_args(self.opts.crf));
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            EasyAnimError::evaluation(format!(
                "failed to spawn '{}': {e}",
                self.opts.ffmpeg.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EasyAnimError::evaluation("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EasyAnimError::evaluation("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EasyAnimError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.cfg = Some(cfg);
        self.last_idx = None;
        tracing::debug!(
            encoder = codec.encoder(),
            width = cfg.width,
            height = cfg.height,
            "ffmpeg started"
        );
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EasyAnimResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| EasyAnimError::evaluation("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(EasyAnimError::evaluation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(EasyAnimError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(EasyAnimError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        // Flatten premultiplied RGBA8 over the configured background.
        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EasyAnimError::evaluation("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            EasyAnimError::evaluation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> EasyAnimResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| EasyAnimError::evaluation("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            EasyAnimError::evaluation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stdout_bytes = join_drain(self.stdout_drain.take(), "stdout")?;
        let stderr_bytes = join_drain(self.stderr_drain.take(), "stderr")?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(EasyAnimError::evaluation(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        tracing::debug!(bytes = stdout_bytes.len(), "ffmpeg finished");
        Ok(stdout_bytes)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited");
            }
            let _ = child.wait();
        }
        let _ = join_drain(self.stdout_drain.take(), "stdout");
        let _ = join_drain(self.stderr_drain.take(), "stderr");
        self.cfg = None;
    }
}

fn drain<R: Read + Send + 'static>(mut r: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stream: &str,
) -> EasyAnimResult<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| EasyAnimError::evaluation(format!("ffmpeg {stream} drain thread panicked")))?
            .map_err(|e| EasyAnimError::evaluation(format!("ffmpeg {stream} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// First codec of `preferences` that appears in an `ffmpeg -encoders` listing.
pub fn pick_codec(preferences: &[VideoCodec], encoders_listing: &str) -> Option<VideoCodec> {
    let available = parse_encoders(encoders_listing);
    preferences
        .iter()
        .copied()
        .find(|c| available.contains(c.encoder()))
}

// Listing rows look like ` V....D libx264   libx264 H.264 ...` after a `------` separator.
fn parse_encoders(listing: &str) -> HashSet<&str> {
    listing
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut cols = l.split_whitespace();
            let flags = cols.next()?;
            let name = cols.next()?;
            flags.starts_with('V').then_some(name)
        })
        .collect()
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, use `-r` before `-i` to specify the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> EasyAnimResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(EasyAnimError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
