//! In-memory collaborators for lifecycle and sweep tests: substitutable
//! stores, a recording notifier, and a manually advanced clock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use plannerbot_types::error::{RepositoryError, TransportError};
use plannerbot_types::session::Session;
use plannerbot_types::user::{NewUser, User};

use crate::clock::Clock;
use crate::notify::{TimeoutNotice, TimeoutNotifier};
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;

/// Clock that only moves when a test tells it to.
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Vec-backed `SessionRepository`.
#[derive(Clone, Default)]
pub(crate) struct MemorySessionRepository {
    rows: Arc<Mutex<Vec<Session>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.rows.lock().unwrap().push(session);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }
}

impl SessionRepository for MemorySessionRepository {
    async fn create_session(&self, session: &Session) -> Result<Session, RepositoryError> {
        self.rows.lock().unwrap().push(session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == *session_id)
            .cloned())
    }

    async fn get_active_for_user(&self, user_id: &Uuid) -> Result<Option<Session>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == *user_id && s.active)
            .max_by_key(|s| s.last_activity)
            .cloned())
    }

    async fn list_expired_active(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Session>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.active && s.last_activity < cutoff)
            .cloned()
            .collect())
    }

    async fn end_session(
        &self,
        session_id: &Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.id == *session_id) {
            Some(session) => {
                session.active = false;
                session.ended_at = Some(ended_at);
                Ok(Some(ended_at))
            }
            None => Ok(None),
        }
    }

    async fn bump_activity(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.id == *session_id) {
            Some(session) => {
                session.last_activity = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Vec-backed `UserRepository`.
#[derive(Clone, Default)]
pub(crate) struct MemoryUserRepository {
    rows: Arc<Mutex<Vec<User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.rows.lock().unwrap().push(user);
    }
}

impl UserRepository for MemoryUserRepository {
    async fn get_or_create(&self, profile: &NewUser) -> Result<(User, bool), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.telegram_id == profile.telegram_id) {
            if profile.username.is_some() {
                user.username = profile.username.clone();
            }
            if profile.first_name.is_some() {
                user.first_name = profile.first_name.clone();
            }
            if profile.last_name.is_some() {
                user.last_name = profile.last_name.clone();
            }
            return Ok((user.clone(), false));
        }
        let user = User {
            id: Uuid::now_v7(),
            telegram_id: profile.telegram_id,
            username: profile.username.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            created_at: Utc::now(),
        };
        rows.push(user.clone());
        Ok((user, true))
    }

    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *user_id)
            .cloned())
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }
}

/// Notifier that records notices and can be told to fail for chosen
/// sessions.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    notices: Arc<Mutex<Vec<TimeoutNotice>>>,
    fail_for: Arc<Mutex<HashSet<Uuid>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<TimeoutNotice> {
        self.notices.lock().unwrap().clone()
    }

    /// Make `notify_timeout` fail for this session id.
    pub fn fail_for(&self, session_id: Uuid) {
        self.fail_for.lock().unwrap().insert(session_id);
    }
}

impl TimeoutNotifier for RecordingNotifier {
    async fn notify_timeout(&self, notice: &TimeoutNotice) -> Result<(), TransportError> {
        if self.fail_for.lock().unwrap().contains(&notice.session_id) {
            return Err(TransportError::Http("injected failure".to_string()));
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}
