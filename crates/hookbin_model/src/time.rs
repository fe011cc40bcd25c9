//! Clock helpers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fixed retention window for captured entries.
pub const ENTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Retention window in epoch milliseconds.
pub const ENTRY_TTL_MS: u64 = ENTRY_TTL.as_millis() as u64;

/// Current time as unix epoch milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
