//! Millisecond timestamps used by cache metadata.

use std::fs::Metadata;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Modification time of a file in epoch milliseconds.
///
/// Returns 0 when the platform doesn't report modification times.
pub fn mtime_millis(meta: &Metadata) -> i64 {
    meta.modified().map(system_time_millis).unwrap_or(0)
}

/// Convert a `SystemTime` to epoch milliseconds.
pub fn system_time_millis(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp_millis()
}
