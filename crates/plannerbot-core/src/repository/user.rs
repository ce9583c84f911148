//! UserRepository trait definition.

use plannerbot_types::error::RepositoryError;
use plannerbot_types::user::{NewUser, User};
use uuid::Uuid;

/// Repository trait for the user directory.
///
/// Implementations live in plannerbot-infra (e.g., `SqliteUserRepository`).
pub trait UserRepository: Send + Sync {
    /// Fetch the user keyed by `profile.telegram_id`, creating the row on
    /// first contact. Name fields supplied in the profile refresh the
    /// stored ones; absent fields are left untouched.
    ///
    /// The boolean is `true` when the user was just created.
    fn get_or_create(
        &self,
        profile: &NewUser,
    ) -> impl std::future::Future<Output = Result<(User, bool), RepositoryError>> + Send;

    /// Fetch a user by internal id.
    fn get_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Fetch a user by Telegram id.
    fn get_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
