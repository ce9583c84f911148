//! Idle-timeout policy.
//!
//! Pure function of (last activity, configured timeout, now). No I/O, no
//! side effects; the single configured duration is read once at startup.

use chrono::{DateTime, Duration, Utc};

/// Decides whether a session has sat idle past the configured timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    timeout: Duration,
}

impl TimeoutPolicy {
    /// Policy from the configured timeout in minutes.
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            timeout: Duration::minutes(minutes),
        }
    }

    /// The configured timeout in whole minutes (for notification text).
    pub fn timeout_minutes(&self) -> i64 {
        self.timeout.num_minutes()
    }

    /// Expired iff `now > last_activity + timeout`.
    ///
    /// Strictly greater-than: a session whose last activity is exactly
    /// `now - timeout` is NOT expired.
    pub fn is_expired(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > last_activity + self.timeout
    }

    /// The `last_activity` threshold below which an active session counts
    /// as expired. Feed this to `SessionRepository::list_expired_active`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.timeout
    }
}
