use crate::animation::sampler::SampleReport;
use crate::foundation::core::{Point, Rect, clamp_time};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::timeline::context::{EditorContext, TimeDriver};

/// Map a pointer x coordinate onto the timeline widget, clamped to `[0, 100]`.
pub fn time_at(pointer_x: f64, widget: Rect) -> EasyAnimResult<f64> {
    let width = widget.width();
    if !width.is_finite() || width <= 0.0 {
        return Err(EasyAnimError::validation(format!(
            "timeline widget width must be positive, got {width}"
        )));
    }
    if !pointer_x.is_finite() {
        return Err(EasyAnimError::validation("pointer x must be finite"));
    }
    Ok(clamp_time((pointer_x - widget.x0) / width * 100.0))
}

/// Pointer-driven seeking on the timeline widget.
///
/// Pointer-down inside the widget takes the timeline (pausing playback); while tracking, moves
/// anywhere on screen keep seeking until pointer-up.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrubController {
    tracking: bool,
}

impl ScrubController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` between an accepted pointer-down and the matching pointer-up.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Begin a scrub if `pointer` hits the widget. Returns `None` when the pointer missed.
    pub fn pointer_down(
        &mut self,
        ctx: &mut EditorContext,
        pointer: Point,
        widget: Rect,
    ) -> EasyAnimResult<Option<SampleReport>> {
        if !widget.contains(pointer) {
            return Ok(None);
        }
        let time = time_at(pointer.x, widget)?;
        ctx.acquire(TimeDriver::Scrub)?;
        self.tracking = true;
        tracing::debug!(time, "scrub started");
        Ok(Some(ctx.move_to(time)))
    }

    /// Continue a scrub. Ignored when not tracking or when playback took the timeline back.
    pub fn pointer_move(
        &mut self,
        ctx: &mut EditorContext,
        pointer_x: f64,
        widget: Rect,
    ) -> EasyAnimResult<Option<SampleReport>> {
        if !self.tracking {
            return Ok(None);
        }
        if ctx.driver() != TimeDriver::Scrub {
            tracing::debug!(owner = ?ctx.driver(), "scrub suspended");
            self.tracking = false;
            return Ok(None);
        }
        let time = time_at(pointer_x, widget)?;
        Ok(Some(ctx.move_to(time)))
    }

    /// End the scrub and hand the timeline back.
    pub fn pointer_up(&mut self, ctx: &mut EditorContext) {
        if std::mem::take(&mut self.tracking) {
            ctx.release(TimeDriver::Scrub);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scrub.rs"]
mod tests;
