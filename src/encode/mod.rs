//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by the export driver.

/// `ffmpeg`-based sink (WebM/MP4 via the system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
