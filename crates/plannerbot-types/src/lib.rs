//! Shared domain types for Plannerbot.
//!
//! This crate contains the value records passed between layers: User,
//! Session, MessagePair, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod error;
pub mod message;
pub mod session;
pub mod user;
