//! Inbound update dispatch: commands, plain text, and callback buttons.

pub mod callbacks;
pub mod commands;
pub mod keyboard;

use plannerbot_infra::telegram::types::{TelegramUser, Update};
use plannerbot_types::user::NewUser;
use tracing::warn;

use crate::state::AppState;

const RETRY_TEXT: &str = "⚠️ Something went wrong on our side. Please try again in a moment.";

/// Route one update to its handler. Failures are logged and answered with
/// a generic retry message; they never escalate past this point.
pub async fn dispatch(state: &AppState, update: Update) {
    if let Some(message) = update.message {
        let chat_id = message.chat.id;
        if let Err(err) = commands::handle_message(state, &message).await {
            warn!(chat_id, %err, "message handling failed");
            send_retry_notice(state, chat_id).await;
        }
    } else if let Some(callback) = update.callback_query {
        let chat_id = callback.message.as_ref().map(|m| m.chat.id);
        if let Err(err) = callbacks::handle_callback(state, &callback).await {
            warn!(callback_id = %callback.id, %err, "callback handling failed");
            if let Some(chat_id) = chat_id {
                send_retry_notice(state, chat_id).await;
            }
        }
    }
    // Other update kinds (edits, channel posts, ...) are skipped by offset.
}

async fn send_retry_notice(state: &AppState, chat_id: i64) {
    if let Err(err) = state.api.send_message(chat_id, RETRY_TEXT, None).await {
        warn!(chat_id, %err, "failed to send retry notice");
    }
}

/// Profile fields for the user directory, taken from the update's sender.
pub(crate) fn profile_from(from: &TelegramUser) -> NewUser {
    NewUser {
        telegram_id: from.id,
        username: from.username.clone(),
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone(),
    }
}
