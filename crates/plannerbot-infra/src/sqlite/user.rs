//! SQLite user directory implementation.

use plannerbot_core::repository::user::UserRepository;
use plannerbot_types::error::RepositoryError;
use plannerbot_types::user::{NewUser, User};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx_err, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    id: String,
    telegram_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            telegram_id: row.try_get("telegram_id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(User {
            id,
            telegram_id: self.telegram_id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at,
        })
    }
}

impl SqliteUserRepository {
    async fn fetch_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn get_or_create(&self, profile: &NewUser) -> Result<(User, bool), RepositoryError> {
        if let Some(existing) = self.fetch_by_telegram_id(profile.telegram_id).await? {
            // Refresh only the name fields the transport supplied this time.
            sqlx::query(
                r#"UPDATE users
                   SET username = COALESCE(?, username),
                       first_name = COALESCE(?, first_name),
                       last_name = COALESCE(?, last_name)
                   WHERE id = ?"#,
            )
            .bind(&profile.username)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(existing.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;

            let user = User {
                username: profile.username.clone().or(existing.username),
                first_name: profile.first_name.clone().or(existing.first_name),
                last_name: profile.last_name.clone().or(existing.last_name),
                ..existing
            };
            return Ok((user, false));
        }

        let user = User {
            id: Uuid::now_v7(),
            telegram_id: profile.telegram_id,
            username: profile.username.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            created_at: chrono::Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO users (id, telegram_id, username, first_name, last_name, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok((user, true))
    }

    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, RepositoryError> {
        self.fetch_by_telegram_id(telegram_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn profile(telegram_id: i64) -> NewUser {
        NewUser {
            telegram_id,
            username: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_creates_on_first_contact() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool);

        let (user, created) = repo.get_or_create(&profile(1)).await.unwrap();
        assert!(created);
        assert_eq!(user.telegram_id, 1);
        assert_eq!(user.username.as_deref(), Some("ada"));

        let found = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.telegram_id, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool);

        let (first, created) = repo.get_or_create(&profile(2)).await.unwrap();
        assert!(created);
        let (second, created_again) = repo.get_or_create(&profile(2)).await.unwrap();
        assert!(!created_again);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_get_or_create_refreshes_supplied_names_only() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool);

        repo.get_or_create(&profile(3)).await.unwrap();

        // New username, no last name supplied -- last name must survive.
        let update = NewUser {
            telegram_id: 3,
            username: Some("countess".to_string()),
            first_name: None,
            last_name: None,
        };
        let (user, created) = repo.get_or_create(&update).await.unwrap();
        assert!(!created);
        assert_eq!(user.username.as_deref(), Some("countess"));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));

        // And the store agrees with the returned snapshot.
        let stored = repo.get_by_telegram_id(3).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some("countess"));
        assert_eq!(stored.last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_lookup_missing_user() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool);

        assert!(repo.get_user(&Uuid::now_v7()).await.unwrap().is_none());
        assert!(repo.get_by_telegram_id(999).await.unwrap().is_none());
    }
}
