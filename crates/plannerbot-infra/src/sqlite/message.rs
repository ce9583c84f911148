//! SQLite message-pair repository implementation.

use chrono::{DateTime, Utc};
use plannerbot_core::repository::message::MessageRepository;
use plannerbot_types::error::RepositoryError;
use plannerbot_types::message::MessagePair;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx_err, parse_datetime};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain MessagePair.
struct MessageRow {
    id: String,
    session_id: String,
    user_telegram_message_id: Option<i64>,
    user_content: String,
    user_sent_at: String,
    bot_telegram_message_id: Option<i64>,
    bot_content: Option<String>,
    bot_sent_at: Option<String>,
    processed: i64,
    processing_ms: Option<i64>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_telegram_message_id: row.try_get("user_telegram_message_id")?,
            user_content: row.try_get("user_content")?,
            user_sent_at: row.try_get("user_sent_at")?,
            bot_telegram_message_id: row.try_get("bot_telegram_message_id")?,
            bot_content: row.try_get("bot_content")?,
            bot_sent_at: row.try_get("bot_sent_at")?,
            processed: row.try_get("processed")?,
            processing_ms: row.try_get("processing_ms")?,
        })
    }

    fn into_pair(self) -> Result<MessagePair, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let user_sent_at = parse_datetime(&self.user_sent_at)?;
        let bot_sent_at = self.bot_sent_at.as_deref().map(parse_datetime).transpose()?;

        Ok(MessagePair {
            id,
            session_id,
            user_telegram_message_id: self.user_telegram_message_id,
            user_content: self.user_content,
            user_sent_at,
            bot_telegram_message_id: self.bot_telegram_message_id,
            bot_content: self.bot_content,
            bot_sent_at,
            processed: self.processed != 0,
            processing_ms: self.processing_ms,
        })
    }
}

fn rows_into_pairs(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<MessagePair>, RepositoryError> {
    let mut pairs = Vec::with_capacity(rows.len());
    for row in &rows {
        let msg_row = MessageRow::from_row(row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        pairs.push(msg_row.into_pair()?);
    }
    Ok(pairs)
}

impl MessageRepository for SqliteMessageRepository {
    async fn create_user_message(&self, pair: &MessagePair) -> Result<MessagePair, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (id, session_id, user_telegram_message_id, user_content, user_sent_at,
                                     bot_telegram_message_id, bot_content, bot_sent_at, processed, processing_ms)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(pair.id.to_string())
        .bind(pair.session_id.to_string())
        .bind(pair.user_telegram_message_id)
        .bind(&pair.user_content)
        .bind(format_datetime(&pair.user_sent_at))
        .bind(pair.bot_telegram_message_id)
        .bind(&pair.bot_content)
        .bind(pair.bot_sent_at.as_ref().map(format_datetime))
        .bind(pair.processed as i64)
        .bind(pair.processing_ms)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(pair.clone())
    }

    async fn add_bot_reply(
        &self,
        pair_id: &Uuid,
        bot_content: &str,
        bot_telegram_message_id: Option<i64>,
        processing_ms: Option<i64>,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE messages
               SET bot_content = ?, bot_telegram_message_id = ?, bot_sent_at = ?,
                   processed = 1, processing_ms = ?
               WHERE id = ?"#,
        )
        .bind(bot_content)
        .bind(bot_telegram_message_id)
        .bind(format_datetime(&at))
        .bind(processing_ms)
        .bind(pair_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_session(
        &self,
        session_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<MessagePair>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY user_sent_at DESC LIMIT ?",
        )
        .bind(session_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_err)?;

        rows_into_pairs(rows)
    }

    async fn list_unprocessed(
        &self,
        session_id: Option<&Uuid>,
    ) -> Result<Vec<MessagePair>, RepositoryError> {
        let rows = match session_id {
            Some(session_id) => {
                sqlx::query("SELECT * FROM messages WHERE processed = 0 AND session_id = ?")
                    .bind(session_id.to_string())
                    .fetch_all(&self.pool.reader)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM messages WHERE processed = 0")
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(map_sqlx_err)?;

        rows_into_pairs(rows)
    }
}
