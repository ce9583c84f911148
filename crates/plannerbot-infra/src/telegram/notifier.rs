//! Telegram implementation of the session-timeout notifier port.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use plannerbot_core::notify::{TimeoutNotice, TimeoutNotifier};
use plannerbot_types::error::TransportError;

use super::client::TelegramApi;
use super::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Delivers session-timeout messages through the Bot API.
///
/// Best effort by contract: the lifecycle manager logs a failed send and
/// moves on; nothing here retries.
pub struct TelegramNotifier {
    api: Arc<TelegramApi>,
}

impl TelegramNotifier {
    pub fn new(api: Arc<TelegramApi>) -> Self {
        Self { api }
    }
}

impl TimeoutNotifier for TelegramNotifier {
    async fn notify_timeout(&self, notice: &TimeoutNotice) -> Result<(), TransportError> {
        let keyboard = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::callback(
                "🤖 Start New Session",
                "assistant_chat",
            )]],
        };
        self.api
            .send_message(notice.telegram_id, &timeout_message(notice), Some(keyboard))
            .await?;
        Ok(())
    }
}

fn stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn timeout_message(notice: &TimeoutNotice) -> String {
    format!(
        "⏰ Session Timeout\n\n\
         Your assistant session has expired after {timeout} minutes of inactivity.\n\n\
         Session Details:\n\
         • Session ID: {id}\n\
         • Started: {started}\n\
         • Ended: {ended}\n\n\
         To start a new session, tap the button below or use the /start command.",
        timeout = notice.timeout_minutes,
        id = notice.session_id,
        started = stamp(notice.started_at),
        ended = stamp(notice.ended_at),
    )
}
