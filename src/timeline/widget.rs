use crate::foundation::core::Rect;
use crate::timeline::context::EditorContext;

/// Horizontal positions of everything drawn on the timeline widget.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineMarkers {
    /// One x per keyframe of every asset; coincident keyframes of different assets repeat.
    pub ticks: Vec<f64>,
    /// Playhead x.
    pub playhead: f64,
}

/// Widget x coordinate of timeline position `time`.
pub fn x_for_time(time: f64, widget: Rect) -> f64 {
    widget.x0 + time / 100.0 * widget.width()
}

/// Marker positions for `ctx` drawn into `widget`.
pub fn markers(ctx: &EditorContext, widget: Rect) -> TimelineMarkers {
    let ticks = ctx
        .keyframes()
        .iter()
        .flat_map(|(_, track)| track.iter().map(|k| x_for_time(k.time, widget)))
        .collect();
    TimelineMarkers {
        ticks,
        playhead: x_for_time(ctx.position(), widget),
    }
}

/// Position label, one decimal.
pub fn format_time(time: f64) -> String {
    format!("Time: {time:.1}%")
}
