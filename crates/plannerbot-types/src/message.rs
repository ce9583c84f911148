//! Message pair types.
//!
//! A [`MessagePair`] binds one user message and the bot's reply to a
//! session, for audit and reply linking. Peripheral to the session
//! lifecycle -- nothing in the core depends on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user message plus the bot's (possibly still pending) reply.
///
/// The user half is written first; the bot half is filled in by
/// `add_bot_reply`, which also flips `processed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePair {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_telegram_message_id: Option<i64>,
    pub user_content: String,
    pub user_sent_at: DateTime<Utc>,
    pub bot_telegram_message_id: Option<i64>,
    pub bot_content: Option<String>,
    pub bot_sent_at: Option<DateTime<Utc>>,
    pub processed: bool,
    /// Time taken to produce the reply, in milliseconds.
    pub processing_ms: Option<i64>,
}

impl MessagePair {
    /// Build the user half of a pair; the bot half is added once the reply
    /// has been sent.
    pub fn from_user(
        session_id: Uuid,
        user_content: String,
        user_telegram_message_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            user_telegram_message_id,
            user_content,
            user_sent_at: now,
            bot_telegram_message_id: None,
            bot_content: None,
            bot_sent_at: None,
            processed: false,
            processing_ms: None,
        }
    }
}
