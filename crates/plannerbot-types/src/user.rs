//! User identity types.
//!
//! A [`User`] ties a Telegram account (external, numeric id) to an internal
//! primary key. Users are created on first contact and their name fields are
//! refreshed on subsequent contact; this subsystem never deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered bot user.
///
/// `telegram_id` is the stable identifier assigned by Telegram, distinct
/// from the internal primary key `id`. Name fields mirror whatever the
/// transport last supplied and may all be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Best display name available: "First Last", then username, then the
    /// numeric Telegram id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .username
                .clone()
                .unwrap_or_else(|| self.telegram_id.to_string()),
        }
    }
}

/// Profile fields captured from an inbound Telegram update, used to create
/// or refresh a [`User`] row.
///
/// `None` fields mean "not supplied this time" and leave the stored value
/// untouched on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
