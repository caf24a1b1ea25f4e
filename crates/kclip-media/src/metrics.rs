//! Render metrics.
//!
//! Recorded through the `metrics` facade; the binary decides whether an
//! exporter is installed.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const RENDERS_STARTED_TOTAL: &str = "kclip_renders_started_total";
    pub const RENDERS_SUCCEEDED_TOTAL: &str = "kclip_renders_succeeded_total";
    pub const RENDERS_FAILED_TOTAL: &str = "kclip_renders_failed_total";
    pub const RENDERS_TIMED_OUT_TOTAL: &str = "kclip_renders_timed_out_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "kclip_ffmpeg_duration_seconds";
}

/// Record an FFmpeg invocation starting.
pub fn record_render_started(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RENDERS_STARTED_TOTAL, &labels).increment(1);
}

/// Record a successful render and its wall-clock duration.
pub fn record_render_succeeded(operation: &str, duration_secs: f64) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RENDERS_SUCCEEDED_TOTAL, &labels).increment(1);
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_render_failed(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RENDERS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_render_timed_out(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RENDERS_TIMED_OUT_TOTAL, &labels).increment(1);
}
