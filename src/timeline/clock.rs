use std::time::{Duration, Instant};

use crate::animation::sampler::{SkipPolicy, sample_assets};
use crate::foundation::core::TIMELINE_END;
use crate::foundation::error::EasyAnimResult;
use crate::timeline::context::{EditorContext, PlaybackState, TimeDriver};

/// Playback cadence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockOpts {
    /// Timeline percent advanced per tick.
    pub step: f64,
    /// Wall-clock time between ticks.
    pub interval: Duration,
}

impl Default for ClockOpts {
    fn default() -> Self {
        Self {
            step: 0.1,
            interval: Duration::from_millis(16),
        }
    }
}

/// What one [`PlaybackClock::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// Position after the tick.
    pub position: f64,
    /// Playback state after the tick.
    pub state: PlaybackState,
    /// Whether the position moved.
    pub advanced: bool,
    /// Assets whose transform was resampled.
    pub updated: usize,
    /// Assets skipped because they are being edited.
    pub skipped: usize,
}

impl TickOutcome {
    fn idle(ctx: &EditorContext) -> Self {
        Self {
            position: ctx.position(),
            state: ctx.playback(),
            advanced: false,
            updated: 0,
            skipped: 0,
        }
    }
}

/// Fixed-step clock that advances the timeline and resamples assets on every tick.
///
/// Reaching the end clamps to exactly 100 and stops; playback never loops.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaybackClock {
    opts: ClockOpts,
}

impl PlaybackClock {
    /// Create a clock with the given cadence.
    pub fn new(opts: ClockOpts) -> Self {
        Self { opts }
    }

    /// Borrow the cadence.
    pub fn opts(&self) -> &ClockOpts {
        &self.opts
    }

    /// Start playback, taking the timeline from any scrub in progress.
    pub fn play(&self, ctx: &mut EditorContext) -> EasyAnimResult<()> {
        ctx.acquire(TimeDriver::Playback)?;
        if !ctx.is_playing() {
            tracing::debug!(position = ctx.position(), "playback started");
            ctx.set_playback(PlaybackState::Playing);
        }
        Ok(())
    }

    /// Stop advancing. The position is kept; snap resolution runs as for any paused seek.
    pub fn pause(&self, ctx: &mut EditorContext) {
        if !ctx.is_playing() {
            return;
        }
        tracing::debug!(position = ctx.position(), "playback paused");
        ctx.set_playback(PlaybackState::Stopped);
        ctx.release(TimeDriver::Playback);
        ctx.resolve_snaps();
    }

    /// Same as [`PlaybackClock::pause`].
    pub fn stop(&self, ctx: &mut EditorContext) {
        self.pause(ctx);
    }

    /// Play/pause button semantics.
    pub fn toggle(&self, ctx: &mut EditorContext) -> EasyAnimResult<PlaybackState> {
        if ctx.is_playing() {
            self.pause(ctx);
        } else {
            self.play(ctx)?;
        }
        Ok(ctx.playback())
    }

    /// Advance one step and resample every asset not being edited.
    pub fn tick(&self, ctx: &mut EditorContext) -> TickOutcome {
        if !ctx.is_playing() {
            return TickOutcome::idle(ctx);
        }
        if ctx.driver() != TimeDriver::Playback {
            tracing::debug!(owner = ?ctx.driver(), "clock lost the timeline, stopping");
            ctx.set_playback(PlaybackState::Stopped);
            return TickOutcome::idle(ctx);
        }

        let next = ctx.position() + self.opts.step;
        if next >= TIMELINE_END {
            ctx.set_position(TIMELINE_END);
            ctx.set_playback(PlaybackState::Stopped);
            ctx.release(TimeDriver::Playback);
            tracing::debug!("playback reached the end");
        } else {
            ctx.set_position(next);
        }

        let time = ctx.position();
        let (assets, store) = ctx.parts_mut();
        let report = sample_assets(time, assets, store, SkipPolicy::HonorEditing);
        TickOutcome {
            position: time,
            state: ctx.playback(),
            advanced: true,
            updated: report.updated,
            skipped: report.skipped,
        }
    }

    /// Tick in real time until playback stops, calling `on_tick` after every tick.
    ///
    /// Deadlines are computed from the start instant so sleep overshoot does not accumulate.
    /// Returns the number of ticks run.
    pub fn run<F>(&self, ctx: &mut EditorContext, mut on_tick: F) -> u64
    where
        F: FnMut(&EditorContext, &TickOutcome),
    {
        let start = Instant::now();
        let mut ticks: u64 = 0;
        while ctx.is_playing() {
            let n = u32::try_from(ticks + 1).unwrap_or(u32::MAX);
            let deadline = start + self.opts.interval.saturating_mul(n);
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            let outcome = self.tick(ctx);
            ticks += 1;
            on_tick(ctx, &outcome);
        }
        ticks
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
