//! Timestamp helpers.
//!
//! Timestamps are exchanged as Unix milliseconds and rendered in JST for humans.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// JST is UTC+9.
const JST_OFFSET_SECONDS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst());
    now_jst.timestamp_millis()
}

/// Render a Unix millisecond timestamp as an RFC 3339 string in JST.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn timestamp_to_jst_rfc3339(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&jst()).to_rfc3339())
}
