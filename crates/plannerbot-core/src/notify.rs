//! Timeout notification port.
//!
//! The lifecycle manager reports expired sessions through this trait; the
//! Telegram implementation lives in plannerbot-infra. Delivery is best
//! effort: the manager logs failures and never retries or rolls back an
//! already-ended session.

use chrono::{DateTime, Utc};
use plannerbot_types::error::TransportError;
use uuid::Uuid;

/// Everything the transport needs to tell a user their session expired.
#[derive(Debug, Clone)]
pub struct TimeoutNotice {
    /// The owner's external (Telegram) id.
    pub telegram_id: i64,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Configured idle timeout, for the message text.
    pub timeout_minutes: i64,
}

/// Delivers a session-timeout message to the external chat transport.
///
/// Implementations live in plannerbot-infra (e.g., `TelegramNotifier`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait TimeoutNotifier: Send + Sync {
    fn notify_timeout(
        &self,
        notice: &TimeoutNotice,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
