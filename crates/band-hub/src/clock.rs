//! Wall-clock helpers.

use time::OffsetDateTime;

/// Milliseconds since the Unix epoch, the unit stored in favorites, comments
/// and local recordings.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
