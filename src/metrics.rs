//! Metrics for photo-cascade.
//!
//! Counters and histograms are emitted through the `metrics` facade.  No
//! recorder is installed by this crate, so they cost nothing unless the
//! hosting process installs one.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

// -- Metric name constants ----------------------------------------------------

/// Handled events (counter). Labels: outcome.
pub const EVENTS_TOTAL: &str = "photo_cascade_events_total";

/// Derived objects reported deleted by the resized bucket (counter).
pub const DERIVED_OBJECTS_DELETED_TOTAL: &str = "photo_cascade_derived_objects_deleted_total";

/// Metadata rows deleted (counter).
pub const METADATA_ROWS_DELETED_TOTAL: &str = "photo_cascade_metadata_rows_deleted_total";

/// Duration of one cascade step in seconds (histogram). Labels: step, status.
pub const STEP_DURATION_SECONDS: &str = "photo_cascade_step_duration_seconds";

/// Register metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(EVENTS_TOTAL, "Handled deletion events by outcome");
    describe_counter!(
        DERIVED_OBJECTS_DELETED_TOTAL,
        "Derived objects deleted from the resized bucket"
    );
    describe_counter!(METADATA_ROWS_DELETED_TOTAL, "Photo metadata rows deleted");
    describe_histogram!(
        STEP_DURATION_SECONDS,
        "Duration of each cascade step in seconds"
    );
}

pub fn record_event(outcome: &'static str) {
    counter!(EVENTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_step(step: &'static str, ok: bool, elapsed: Duration) {
    let status = if ok { "ok" } else { "error" };
    histogram!(STEP_DURATION_SECONDS, "step" => step, "status" => status)
        .record(elapsed.as_secs_f64());
}

pub fn record_derived_objects_deleted(count: usize) {
    counter!(DERIVED_OBJECTS_DELETED_TOTAL).increment(count as u64);
}

pub fn record_metadata_rows_deleted(count: u64) {
    counter!(METADATA_ROWS_DELETED_TOTAL).increment(count);
}
