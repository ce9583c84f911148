//! Conversational session types.
//!
//! A [`Session`] is an immutable snapshot of one assistant conversation,
//! returned by value from the store layer. At most one session per user is
//! active at a time (enforced by lifecycle discipline, not by the schema).
//! A session is terminal once ended: it is never reactivated -- a new one
//! is created instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of a conversational session.
///
/// `last_activity` is non-decreasing while the session is active and stops
/// moving once `active` flips to false. `ended_at` is set when the session
/// is closed, either by the background sweep or by an on-demand expiry
/// check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub active: bool,
    /// Free-form context blob attached at creation.
    pub context: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Build a fresh active session snapshot with
    /// `started_at == last_activity == now`.
    pub fn open(user_id: Uuid, context: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            active: true,
            context,
            started_at: now,
            ended_at: None,
            last_activity: now,
        }
    }
}
