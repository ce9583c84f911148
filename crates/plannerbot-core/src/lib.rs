//! Session lifecycle logic and repository trait definitions for Plannerbot.
//!
//! This crate defines the "ports" (repository and notifier traits) that the
//! infrastructure layer implements, plus the session lifecycle manager and
//! its background sweep. It depends only on `plannerbot-types` -- never on
//! `plannerbot-infra` or any database/IO crate.

pub mod clock;
pub mod notify;
pub mod repository;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
