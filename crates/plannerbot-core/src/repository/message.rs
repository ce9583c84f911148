//! MessageRepository trait definition.
//!
//! Message pairs are peripheral to the session lifecycle; they exist for
//! audit and reply linking.

use chrono::{DateTime, Utc};
use plannerbot_types::error::RepositoryError;
use plannerbot_types::message::MessagePair;
use uuid::Uuid;

/// Repository trait for message-pair persistence.
pub trait MessageRepository: Send + Sync {
    /// Persist the user half of a pair (bot reply still pending).
    fn create_user_message(
        &self,
        pair: &MessagePair,
    ) -> impl std::future::Future<Output = Result<MessagePair, RepositoryError>> + Send;

    /// Attach the bot's reply to an existing pair and mark it processed.
    /// `false` when no such pair exists.
    fn add_bot_reply(
        &self,
        pair_id: &Uuid,
        bot_content: &str,
        bot_telegram_message_id: Option<i64>,
        processing_ms: Option<i64>,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Message pairs for a session, newest first.
    fn list_for_session(
        &self,
        session_id: &Uuid,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<MessagePair>, RepositoryError>> + Send;

    /// Pairs the bot has not replied to yet, optionally scoped to one
    /// session.
    fn list_unprocessed(
        &self,
        session_id: Option<&Uuid>,
    ) -> impl std::future::Future<Output = Result<Vec<MessagePair>, RepositoryError>> + Send;
}
