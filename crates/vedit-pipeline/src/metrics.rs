//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_COMPLETED_TOTAL: &str = "vedit_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "vedit_runs_failed_total";
    pub const RUN_DURATION_SECONDS: &str = "vedit_run_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vedit_stage_duration_seconds";

    pub const FRAMES_CAPTURED_TOTAL: &str = "vedit_frames_captured_total";
    pub const FRAMES_FAILED_TOTAL: &str = "vedit_frames_failed_total";
    pub const FRAMES_NORMALIZE_FAILED_TOTAL: &str = "vedit_frames_normalize_failed_total";

    pub const CLIPS_PROCESSED_TOTAL: &str = "vedit_clips_processed_total";
    pub const CLIPS_FAILED_TOTAL: &str = "vedit_clips_failed_total";

    pub const CLEANUP_FAILURES_TOTAL: &str = "vedit_cleanup_failures_total";
}

pub fn record_run_completed(duration_secs: f64) {
    counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
    histogram!(names::RUN_DURATION_SECONDS).record(duration_secs);
}

pub fn record_run_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_capture(captured: usize, failed: usize) {
    counter!(names::FRAMES_CAPTURED_TOTAL).increment(captured as u64);
    counter!(names::FRAMES_FAILED_TOTAL).increment(failed as u64);
}

pub fn record_normalize_failures(failed: usize) {
    counter!(names::FRAMES_NORMALIZE_FAILED_TOTAL).increment(failed as u64);
}

pub fn record_clip(effect: &str, success: bool) {
    let labels = [("effect", effect.to_string())];
    if success {
        counter!(names::CLIPS_PROCESSED_TOTAL, &labels).increment(1);
    } else {
        counter!(names::CLIPS_FAILED_TOTAL, &labels).increment(1);
    }
}

pub fn record_cleanup_failures(count: usize) {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(count as u64);
}
