//! Inline keyboards shared across handlers.

use plannerbot_infra::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// The main menu, two buttons per row.
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton::callback("💰 Add Income/Expense", "add_transaction"),
                InlineKeyboardButton::callback("🎯 Set Savings Goal", "set_savings_goal"),
            ],
            vec![
                InlineKeyboardButton::callback("📊 Financial Reports", "financial_reports"),
                InlineKeyboardButton::callback("🤖 Chat with Assistant", "assistant_chat"),
            ],
        ],
    }
}
