//! SessionRepository trait definition.
//!
//! CRUD operations over session rows. Timestamps are supplied by the
//! caller (the lifecycle manager stamps them from its injected clock) so
//! the store stays deterministic under test.

use chrono::{DateTime, Utc};
use plannerbot_types::error::RepositoryError;
use plannerbot_types::session::Session;
use uuid::Uuid;

/// Repository trait for session persistence.
///
/// Implementations live in plannerbot-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Absence is
/// signaled with `Option`/`bool`, never an error.
pub trait SessionRepository: Send + Sync {
    /// Persist a new session snapshot (built with `active=true` and
    /// `last_activity == started_at`).
    fn create_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// Get a session by its unique id.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// The user's active session, or `None`.
    ///
    /// When lifecycle discipline has been violated and multiple active rows
    /// exist, returns the most recently active one.
    fn get_active_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// All active sessions whose `last_activity` is strictly before
    /// `cutoff`. Used by the background sweep.
    fn list_expired_active(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;

    /// Close a session: `active=false`, `ended_at=ended_at`. Returns the
    /// stamp, or `None` when no such session exists.
    ///
    /// Deliberately idempotent-by-restamp: ending an already-ended session
    /// overwrites `ended_at` with the new stamp.
    fn end_session(
        &self,
        session_id: &Uuid,
        ended_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<DateTime<Utc>>, RepositoryError>> + Send;

    /// Move `last_activity` forward. `false` when no such session exists.
    fn bump_activity(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
