//! Metrics for scheduling and reduction.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Scheduling
    pub const TAKES_SCHEDULED_TOTAL: &str = "mvgen_takes_scheduled_total";
    pub const CUTS_SCHEDULED_TOTAL: &str = "mvgen_cuts_scheduled_total";
    pub const CLIP_RETRIES_TOTAL: &str = "mvgen_clip_retries_total";

    // Rendering
    pub const TAKES_RENDERED_TOTAL: &str = "mvgen_takes_rendered_total";

    // Reduction
    pub const BLENDS_EXECUTED_TOTAL: &str = "mvgen_blends_executed_total";
    pub const BLENDS_SKIPPED_TOTAL: &str = "mvgen_blends_skipped_total";
    pub const REDUCTION_DURATION_SECONDS: &str = "mvgen_reduction_duration_seconds";
}

/// Record one scheduled take and its cut count.
pub fn record_take_scheduled(mode: &str, cuts: usize) {
    let labels = [("mode", mode.to_string())];
    counter!(names::TAKES_SCHEDULED_TOTAL, &labels).increment(1);
    counter!(names::CUTS_SCHEDULED_TOTAL, &labels).increment(cuts as u64);
}

/// Record clip draws that were rejected for being too short.
pub fn record_clip_retries(retries: u64) {
    if retries > 0 {
        counter!(names::CLIP_RETRIES_TOTAL).increment(retries);
    }
}

/// Record a take render; `outcome` is `rendered` or `skipped`.
pub fn record_take_rendered(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::TAKES_RENDERED_TOTAL, &labels).increment(1);
}

pub fn record_blend_executed(level: usize) {
    let labels = [("level", level.to_string())];
    counter!(names::BLENDS_EXECUTED_TOTAL, &labels).increment(1);
}

pub fn record_blends_skipped(count: usize) {
    if count > 0 {
        counter!(names::BLENDS_SKIPPED_TOTAL).increment(count as u64);
    }
}

pub fn record_reduction_duration(takes: usize, duration_secs: f64) {
    let labels = [("takes", takes.to_string())];
    histogram!(names::REDUCTION_DURATION_SECONDS, &labels).record(duration_secs);
}
