//! Command and plain-text message handlers.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use plannerbot_core::repository::message::MessageRepository;
use plannerbot_core::repository::user::UserRepository;
use plannerbot_core::session::lifecycle::SessionOutcome;
use plannerbot_infra::telegram::types::{IncomingMessage, TelegramUser};
use plannerbot_types::message::MessagePair;

use crate::handlers::{keyboard, profile_from};
use crate::state::AppState;

/// Context blob attached to assistant sessions at creation.
const SESSION_CONTEXT: &str = "Assistant chat session";

/// Static placeholder until the assistant back-end lands.
const ASSISTANT_PLACEHOLDER: &str = "📝 Noted! Personalized financial guidance is coming soon. \
In the meantime, use /menu to explore what I can already do.";

/// Which handler a message routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Start,
    Menu,
    Help,
    UnknownCommand,
    AssistantText,
}

/// Route on the first token; "/start@SomeBot extra" counts as "/start".
fn route(text: &str) -> Route {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Route::AssistantText;
    }
    let command = trimmed
        .split_whitespace()
        .next()
        .and_then(|token| token.split('@').next())
        .unwrap_or(trimmed);
    match command {
        "/start" => Route::Start,
        "/menu" => Route::Menu,
        "/help" => Route::Help,
        _ => Route::UnknownCommand,
    }
}

pub async fn handle_message(state: &AppState, message: &IncomingMessage) -> Result<()> {
    let Some(from) = &message.from else {
        debug!(message_id = message.message_id, "message without sender, ignoring");
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    let Some(text) = message.text.as_deref() else {
        // Stickers, photos, and friends get the same pointer as unknown
        // commands.
        state
            .api
            .send_message(message.chat.id, &fallback_text(), None)
            .await?;
        return Ok(());
    };

    match route(text) {
        Route::Start => start(state, message.chat.id, from).await,
        Route::Menu => menu(state, message.chat.id).await,
        Route::Help => help(state, message.chat.id).await,
        Route::UnknownCommand => {
            state
                .api
                .send_message(message.chat.id, &fallback_text(), None)
                .await?;
            Ok(())
        }
        Route::AssistantText => assistant_text(state, message, from, text).await,
    }
}

/// /start: register (or refresh) the user and greet accordingly.
async fn start(state: &AppState, chat_id: i64, from: &TelegramUser) -> Result<()> {
    let (user, is_new) = state.users.get_or_create(&profile_from(from)).await?;

    let text = if is_new {
        format!("🎉 Welcome to {}!", state.bot_name)
    } else {
        format!("👋 Welcome back to {}!", state.bot_name)
    };
    info!(telegram_id = user.telegram_id, is_new, "handled /start");
    state.api.send_message(chat_id, &text, None).await?;
    Ok(())
}

/// /menu: the main inline-keyboard menu.
async fn menu(state: &AppState, chat_id: i64) -> Result<()> {
    state
        .api
        .send_message(chat_id, "📋 Main Menu:", Some(keyboard::main_menu()))
        .await?;
    Ok(())
}

/// /help: static command overview.
async fn help(state: &AppState, chat_id: i64) -> Result<()> {
    let text = format!(
        "🤖 {} - Help\n\n\
         Available commands:\n\
         /start - Start the bot\n\
         /menu - Show the main menu\n\
         /help - Show this help message\n\n\
         Main Features:\n\
         💰 Budget Planning\n\
         📊 Investment Analysis\n\
         💳 Expense Tracking\n\
         📈 Financial Reports\n\n\
         For support, contact the bot administrator.",
        state.bot_name
    );
    state.api.send_message(chat_id, &text, None).await?;
    Ok(())
}

fn fallback_text() -> String {
    "I didn't understand that. Please use /menu to see available options or /help for more information."
        .to_string()
}

/// Plain text goes to the assistant: resolve the session (creating or
/// renewing as needed), record the message pair, and send the placeholder
/// reply.
async fn assistant_text(
    state: &AppState,
    message: &IncomingMessage,
    from: &TelegramUser,
    text: &str,
) -> Result<()> {
    let started = std::time::Instant::now();

    let (user, _) = state.users.get_or_create(&profile_from(from)).await?;
    let outcome = state
        .lifecycle
        .ensure_session(user.id, Some(SESSION_CONTEXT))
        .await?;

    let pair = MessagePair::from_user(
        outcome.session().id,
        text.to_string(),
        Some(message.message_id),
        Utc::now(),
    );
    state.messages.create_user_message(&pair).await?;

    let reply = reply_text(&outcome, state.lifecycle.policy().timeout_minutes());
    let sent = state.api.send_message(message.chat.id, &reply, None).await?;

    let processing_ms = started.elapsed().as_millis() as i64;
    state
        .messages
        .add_bot_reply(&pair.id, &reply, Some(sent.message_id), Some(processing_ms), Utc::now())
        .await?;
    Ok(())
}

fn reply_text(outcome: &SessionOutcome, timeout_minutes: i64) -> String {
    match outcome {
        SessionOutcome::Renewed { .. } => format!(
            "⏰ Your previous session expired after {timeout_minutes} minutes of inactivity, \
             so I've started a new one.\n\n{ASSISTANT_PLACEHOLDER}"
        ),
        _ => ASSISTANT_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plannerbot_types::session::Session;
    use uuid::Uuid;

    #[test]
    fn test_route_commands() {
        assert_eq!(route("/start"), Route::Start);
        assert_eq!(route("/menu"), Route::Menu);
        assert_eq!(route("/help"), Route::Help);
        assert_eq!(route("/unknown"), Route::UnknownCommand);
    }

    #[test]
    fn test_route_strips_mention_and_args() {
        assert_eq!(route("/start@PlannerBot"), Route::Start);
        assert_eq!(route("/menu extra words"), Route::Menu);
        assert_eq!(route("  /help  "), Route::Help);
    }

    #[test]
    fn test_route_plain_text_goes_to_assistant() {
        assert_eq!(route("how do I budget?"), Route::AssistantText);
        assert_eq!(route("slash /start mid-sentence"), Route::AssistantText);
    }

    #[test]
    fn test_reply_text_mentions_expiry_on_renewal() {
        let now = Utc::now();
        let expired = Session {
            active: false,
            ended_at: Some(now),
            ..Session::open(Uuid::now_v7(), None, now)
        };
        let replacement = Session::open(expired.user_id, None, now);
        let renewed = SessionOutcome::Renewed {
            expired,
            replacement,
        };

        let text = reply_text(&renewed, 30);
        assert!(text.contains("expired after 30 minutes"));

        let continued = SessionOutcome::Continued(Session::open(Uuid::now_v7(), None, now));
        assert!(!reply_text(&continued, 30).contains("expired"));
    }
}
