use crate::foundation::error::{EasyAnimError, EasyAnimResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Start of the normalized timeline (percent).
pub const TIMELINE_START: f64 = 0.0;
/// End of the normalized timeline (percent).
pub const TIMELINE_END: f64 = 100.0;
/// Smallest width/height an asset may have, in canvas pixels.
pub const MIN_ASSET_SIZE: f64 = 40.0;

/// Clamp a timeline position into `[TIMELINE_START, TIMELINE_END]`.
pub fn clamp_time(time: f64) -> f64 {
    time.clamp(TIMELINE_START, TIMELINE_END)
}

/// Spatial state of an asset: top-left position, size and rotation.
///
/// `rotation` is in degrees and intentionally unbounded: a rotate gesture accumulates past
/// 360 and the sampler interpolates the raw value.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Clockwise rotation about the centre, in degrees.
    pub rotation: f64,
}

impl Transform {
    /// Build a transform from its five components.
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    /// Return a copy with width/height raised to [`MIN_ASSET_SIZE`].
    pub fn with_min_size(self) -> Self {
        Self {
            width: self.width.max(MIN_ASSET_SIZE),
            height: self.height.max(MIN_ASSET_SIZE),
            ..self
        }
    }

    /// Centre of the asset box in canvas space.
    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Reject non-finite components.
    pub fn validate(self) -> EasyAnimResult<()> {
        let all_finite = [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(EasyAnimError::validation(
                "transform components must be finite",
            ));
        }
        Ok(())
    }
}

/// Absolute 0-based frame index in an exported video.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> EasyAnimResult<Self> {
        if den == 0 {
            return Err(EasyAnimError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(EasyAnimError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }
}

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest desktop canvas of the editor; also the export reference resolution.
    pub const REFERENCE: Canvas = Canvas {
        width: 1000,
        height: 580,
    };

    /// Reject zero-sized canvases.
    pub fn validate(self) -> EasyAnimResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EasyAnimError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
