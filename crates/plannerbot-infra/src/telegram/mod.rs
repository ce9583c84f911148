//! Telegram Bot API transport.
//!
//! A minimal typed client for the handful of Bot API methods the bot
//! consumes (getUpdates, sendMessage, editMessageText, answerCallbackQuery)
//! plus the [`TelegramNotifier`] implementation of the core timeout port.

pub mod client;
pub mod notifier;
pub mod types;

pub use client::TelegramApi;
pub use notifier::TelegramNotifier;
