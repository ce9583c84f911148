//! TelegramApi -- typed HTTP client for the Bot API subset the bot uses.
//!
//! Sends JSON POST requests to `https://api.telegram.org/bot<token>/<method>`
//! and unwraps the `{ok, result, description}` envelope. The token is
//! wrapped in [`secrecy::SecretString`] and only exposed while building the
//! request URL; it never appears in Debug output or logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use plannerbot_types::error::TransportError;

use super::types::{
    AnswerCallbackQueryPayload, ApiEnvelope, EditMessageTextPayload, GetUpdatesPayload,
    InlineKeyboardMarkup, SendMessagePayload, SentMessage, Update,
};

/// Telegram Bot API client.
///
/// # Token Security
///
/// Does NOT derive Debug: the token is part of every request URL and must
/// never leak through formatting.
pub struct TelegramApi {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl TelegramApi {
    /// HTTP timeout; must exceed the getUpdates long-poll hold time.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(70);

    /// Create a new client for the given bot token.
    pub fn new(token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            token,
            base_url: "https://api.telegram.org".to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Build the full URL for a Bot API method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method)
    }

    /// POST a method payload and unwrap the response envelope.
    async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, TransportError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Http(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("{method}: HTTP {status}: {body}")));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Deserialization(format!("{method}: {e}")))?;

        if !envelope.ok {
            return Err(TransportError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        envelope.result.ok_or_else(|| {
            TransportError::Deserialization(format!("{method}: ok response without result"))
        })
    }

    /// Long-poll for updates, holding the connection up to `timeout_secs`.
    ///
    /// `offset` should be one past the last handled `update_id` so handled
    /// updates are confirmed and dropped server-side.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdatesPayload {
                offset,
                timeout: timeout_secs,
            },
        )
        .await
    }

    /// Send a text message, optionally with an inline keyboard.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<SentMessage, TransportError> {
        self.call(
            "sendMessage",
            &SendMessagePayload {
                chat_id,
                text: text.to_string(),
                reply_markup,
            },
        )
        .await
    }

    /// Replace the text (and keyboard) of a previously sent message.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        // The result is the edited Message (or `true` for inline messages);
        // the bot doesn't use it either way.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageTextPayload {
                    chat_id,
                    message_id,
                    text: text.to_string(),
                    reply_markup,
                },
            )
            .await?;
        Ok(())
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryPayload {
                    callback_query_id: callback_query_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }
}
