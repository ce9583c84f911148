//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `plannerbot-core` using sqlx with
//! split read/write pools: raw queries, a private Row struct, reads on the
//! reader pool and writes on the writer pool.

use chrono::{DateTime, Utc};
use plannerbot_core::repository::session::SessionRepository;
use plannerbot_types::error::RepositoryError;
use plannerbot_types::session::Session;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx_err, parse_datetime};

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Session.
struct SessionRow {
    id: String,
    user_id: String,
    active: i64,
    context: Option<String>,
    started_at: String,
    ended_at: Option<String>,
    last_activity: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            active: row.try_get("active")?,
            context: row.try_get("context")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            last_activity: row.try_get("last_activity")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let started_at = parse_datetime(&self.started_at)?;
        let ended_at = self.ended_at.as_deref().map(parse_datetime).transpose()?;
        let last_activity = parse_datetime(&self.last_activity)?;

        Ok(Session {
            id,
            user_id,
            active: self.active != 0,
            context: self.context,
            started_at,
            ended_at,
            last_activity,
        })
    }
}

fn rows_into_sessions(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Session>, RepositoryError> {
    let mut sessions = Vec::with_capacity(rows.len());
    for row in &rows {
        let session_row = SessionRow::from_row(row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        sessions.push(session_row.into_session()?);
    }
    Ok(sessions)
}

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &Session) -> Result<Session, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO sessions (id, user_id, active, context, started_at, ended_at, last_activity)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.active as i64)
        .bind(&session.context)
        .bind(format_datetime(&session.started_at))
        .bind(session.ended_at.as_ref().map(format_datetime))
        .bind(format_datetime(&session.last_activity))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn get_active_for_user(&self, user_id: &Uuid) -> Result<Option<Session>, RepositoryError> {
        // Multiple active rows should not occur, but if lifecycle discipline
        // was ever violated the most recently active one wins.
        let row = sqlx::query(
            "SELECT * FROM sessions WHERE user_id = ? AND active = 1 ORDER BY last_activity DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_err)?;
        tracing::debug!(user_id = %user_id, found = row.is_some(), "active session lookup");

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_expired_active(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Session>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM sessions WHERE active = 1 AND last_activity < ?")
            .bind(format_datetime(&cutoff))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        rows_into_sessions(rows)
    }

    async fn end_session(
        &self,
        session_id: &Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        // No `active = 1` guard: re-ending an already-ended session
        // re-stamps ended_at.
        let result = sqlx::query("UPDATE sessions SET active = 0, ended_at = ? WHERE id = ?")
            .bind(format_datetime(&ended_at))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(ended_at))
    }

    async fn bump_activity(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE sessions SET last_activity = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn insert_user(pool: &DatabasePool, telegram_id: i64) -> Uuid {
        let user_id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO users (id, telegram_id, username, first_name, last_name, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.to_string())
        .bind(telegram_id)
        .bind(Option::<String>::None)
        .bind(Option::<String>::None)
        .bind(Option::<String>::None)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        user_id
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 100).await;

        let session = Session::open(user_id, Some("chat".to_string()), Utc::now());
        let created = repo.create_session(&session).await.unwrap();
        assert_eq!(created.id, session.id);

        let found = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, user_id);
        assert!(found.active);
        assert_eq!(found.context.as_deref(), Some("chat"));
        assert_eq!(found.started_at, session.started_at);
        assert!(found.ended_at.is_none());
    }

    #[tokio::test]
    async fn test_get_active_for_user_picks_most_recent() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 101).await;

        let now = Utc::now();
        let older = Session::open(user_id, None, now - Duration::minutes(20));
        let newer = Session::open(user_id, None, now);
        repo.create_session(&older).await.unwrap();
        repo.create_session(&newer).await.unwrap();

        let active = repo.get_active_for_user(&user_id).await.unwrap().unwrap();
        assert_eq!(active.id, newer.id);
    }

    #[tokio::test]
    async fn test_get_active_for_user_ignores_ended() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 102).await;

        let session = Session::open(user_id, None, Utc::now());
        repo.create_session(&session).await.unwrap();
        repo.end_session(&session.id, Utc::now()).await.unwrap();

        assert!(repo.get_active_for_user(&user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_session_stamps_and_restamps() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 103).await;

        let session = Session::open(user_id, None, Utc::now());
        repo.create_session(&session).await.unwrap();

        let first_end = Utc::now();
        let stamped = repo.end_session(&session.id, first_end).await.unwrap();
        assert_eq!(stamped, Some(first_end));

        // Re-ending overwrites ended_at rather than rejecting.
        let second_end = first_end + Duration::minutes(5);
        let restamped = repo.end_session(&session.id, second_end).await.unwrap();
        assert_eq!(restamped, Some(second_end));

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.ended_at, Some(second_end));
    }

    #[tokio::test]
    async fn test_end_session_missing_returns_none() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());

        let result = repo.end_session(&Uuid::now_v7(), Utc::now()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_bump_activity() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 104).await;

        let session = Session::open(user_id, None, Utc::now());
        repo.create_session(&session).await.unwrap();

        let later = session.last_activity + Duration::minutes(3);
        assert!(repo.bump_activity(&session.id, later).await.unwrap());

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.last_activity, later);

        assert!(!repo.bump_activity(&Uuid::now_v7(), later).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_expired_active_respects_cutoff() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_a = insert_user(&pool, 105).await;
        let user_b = insert_user(&pool, 106).await;
        let user_c = insert_user(&pool, 107).await;

        let now = Utc::now();
        let cutoff = now - Duration::minutes(30);

        let stale = Session::open(user_a, None, cutoff - Duration::seconds(1));
        let boundary = Session::open(user_b, None, cutoff);
        let fresh = Session::open(user_c, None, now);
        repo.create_session(&stale).await.unwrap();
        repo.create_session(&boundary).await.unwrap();
        repo.create_session(&fresh).await.unwrap();

        let expired = repo.list_expired_active(cutoff).await.unwrap();
        // Strictly before the cutoff: the boundary row is not expired.
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, stale.id);
    }

    #[tokio::test]
    async fn test_list_expired_active_skips_ended() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());
        let user_id = insert_user(&pool, 108).await;

        let now = Utc::now();
        let session = Session::open(user_id, None, now - Duration::hours(2));
        repo.create_session(&session).await.unwrap();
        repo.end_session(&session.id, now).await.unwrap();

        let expired = repo.list_expired_active(now - Duration::minutes(30)).await.unwrap();
        assert!(expired.is_empty());
    }
}
