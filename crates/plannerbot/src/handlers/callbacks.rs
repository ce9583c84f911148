//! Callback-query handlers for the inline menu buttons.

use anyhow::Result;
use tracing::{debug, info};

use plannerbot_core::repository::user::UserRepository;
use plannerbot_core::session::lifecycle::SessionOutcome;
use plannerbot_infra::telegram::types::{CallbackQuery, TelegramUser};

use crate::handlers::{keyboard, profile_from};
use crate::state::AppState;

const SESSION_CONTEXT: &str = "Assistant chat session";

const ADD_TRANSACTION_TEXT: &str = "💰 Add Income/Expense\n\n\
This feature will help you:\n\
• Track your income sources\n\
• Log daily expenses\n\
• Categorize transactions\n\
• Monitor cash flow\n\n\
Feature coming soon! 🚀";

const SAVINGS_GOAL_TEXT: &str = "🎯 Set Savings Goal\n\n\
This feature will help you:\n\
• Define financial targets\n\
• Track progress towards goals\n\
• Set milestone reminders\n\
• Calculate required savings\n\n\
Feature coming soon! 🚀";

const FINANCIAL_REPORTS_TEXT: &str = "📊 Financial Reports\n\n\
This feature will help you:\n\
• Monthly financial summaries\n\
• Spending trends analysis\n\
• Income vs expense charts\n\
• Goal progress tracking\n\n\
Feature coming soon! 🚀";

pub async fn handle_callback(state: &AppState, callback: &CallbackQuery) -> Result<()> {
    // Ack first so the client stops its spinner even if handling fails.
    state.api.answer_callback_query(&callback.id).await?;

    let Some(data) = callback.data.as_deref() else {
        return Ok(());
    };
    // Fall back to a direct message when the keyboard's message is gone.
    let chat_id = callback
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .unwrap_or(callback.from.id);
    let message_id = callback.message.as_ref().map(|m| m.message_id);

    match data {
        "add_transaction" => feature_blurb(state, chat_id, message_id, ADD_TRANSACTION_TEXT).await,
        "set_savings_goal" => feature_blurb(state, chat_id, message_id, SAVINGS_GOAL_TEXT).await,
        "financial_reports" => {
            feature_blurb(state, chat_id, message_id, FINANCIAL_REPORTS_TEXT).await
        }
        "assistant_chat" => assistant_chat(state, chat_id, &callback.from).await,
        other => {
            debug!(data = other, "unknown callback data, ignoring");
            Ok(())
        }
    }
}

/// Replace the menu message with a feature blurb, keeping the menu
/// keyboard underneath.
async fn feature_blurb(
    state: &AppState,
    chat_id: i64,
    message_id: Option<i64>,
    text: &str,
) -> Result<()> {
    match message_id {
        Some(message_id) => {
            state
                .api
                .edit_message_text(chat_id, message_id, text, Some(keyboard::main_menu()))
                .await?;
        }
        None => {
            state
                .api
                .send_message(chat_id, text, Some(keyboard::main_menu()))
                .await?;
        }
    }
    Ok(())
}

/// The "Chat with Assistant" button: resolve or renew the user's session
/// and report what happened.
async fn assistant_chat(state: &AppState, chat_id: i64, from: &TelegramUser) -> Result<()> {
    let (user, _) = state.users.get_or_create(&profile_from(from)).await?;
    let outcome = state
        .lifecycle
        .ensure_session(user.id, Some(SESSION_CONTEXT))
        .await?;

    info!(
        telegram_id = user.telegram_id,
        session_id = %outcome.session().id,
        "assistant chat opened"
    );
    let text = assistant_chat_text(&outcome, state.lifecycle.policy().timeout_minutes());
    state.api.send_message(chat_id, &text, None).await?;
    Ok(())
}

fn stamp(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn assistant_chat_text(outcome: &SessionOutcome, timeout_minutes: i64) -> String {
    match outcome {
        SessionOutcome::Started(session) => format!(
            "🤖 Chat with the Assistant\n\n\
             ✅ New session created!\n\
             Session ID: {id}\n\
             Started at: {started}\n\n\
             I'm ready to help with your financial questions and planning -- \
             just send me a message.\n\n\
             Type /menu to return to the main menu anytime.",
            id = session.id,
            started = stamp(session.started_at),
        ),
        SessionOutcome::Continued(session) => format!(
            "🤖 Chat with the Assistant\n\n\
             ✅ Continuing your existing session!\n\
             Session ID: {id}\n\
             Started at: {started}\n\
             Last activity: {last}\n\n\
             I'm ready to help with your financial questions and planning -- \
             just send me a message.\n\n\
             Type /menu to return to the main menu anytime.",
            id = session.id,
            started = stamp(session.started_at),
            last = stamp(session.last_activity),
        ),
        SessionOutcome::Renewed {
            expired,
            replacement,
        } => format!(
            "🤖 Chat with the Assistant\n\n\
             ⏰ Your previous session ({old}) expired after {timeout_minutes} minutes of inactivity.\n\
             ✅ New session created!\n\
             Session ID: {id}\n\
             Started at: {started}\n\n\
             I'm ready to help with your financial questions and planning -- \
             just send me a message.\n\n\
             Type /menu to return to the main menu anytime.",
            old = expired.id,
            id = replacement.id,
            started = stamp(replacement.started_at),
        ),
    }
}
