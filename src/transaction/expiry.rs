//! Payment-confirmation window
//!
//! Pure wall-clock arithmetic over the 15-minute confirmation window. There
//! is no background scheduler: expiry is evaluated lazily, only when a
//! transaction is read or acted upon. An expired-but-unread transaction
//! stays in its pre-expiry state in storage until someone queries it.

use chrono::{DateTime, Utc};

/// Confirmation window: 15 minutes
pub const CONFIRM_WINDOW_SECS: i64 = 900;

/// Seconds since creation, clamped to >= 0.
#[inline]
pub fn elapsed_seconds(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_seconds().max(0)
}

/// Seconds left in the window: `max(0, 900 - elapsed)`.
#[inline]
pub fn remaining_seconds(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (CONFIRM_WINDOW_SECS - elapsed_seconds(created_at, now)).max(0)
}

/// Whether the window has elapsed.
#[inline]
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    elapsed_seconds(created_at, now) > CONFIRM_WINDOW_SECS
}
