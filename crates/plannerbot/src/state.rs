//! Application state wiring all services together.
//!
//! `AppState` holds the concrete instances used by the poll loop and
//! handlers. The lifecycle manager is generic over its collaborators, but
//! AppState pins it to the SQLite and Telegram implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use plannerbot_core::clock::SystemClock;
use plannerbot_core::session::lifecycle::SessionLifecycle;
use plannerbot_core::session::policy::TimeoutPolicy;
use plannerbot_infra::sqlite::message::SqliteMessageRepository;
use plannerbot_infra::sqlite::pool::DatabasePool;
use plannerbot_infra::sqlite::session::SqliteSessionRepository;
use plannerbot_infra::sqlite::user::SqliteUserRepository;
use plannerbot_infra::telegram::{TelegramApi, TelegramNotifier};

use crate::config::Config;

/// Concrete type alias for the lifecycle generics pinned to infra implementations.
pub type ConcreteLifecycle =
    SessionLifecycle<SqliteSessionRepository, SqliteUserRepository, TelegramNotifier, SystemClock>;

/// Shared application state for the poll loop, handlers, and sweep.
pub struct AppState {
    pub api: Arc<TelegramApi>,
    pub lifecycle: Arc<ConcreteLifecycle>,
    pub users: SqliteUserRepository,
    pub messages: SqliteMessageRepository,
    pub bot_name: String,
}

impl AppState {
    /// Initialize the application state: connect to the DB, wire services.
    pub async fn init(config: &Config) -> anyhow::Result<Self> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".plannerbot")
            }
        };

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("plannerbot.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let api = Arc::new(TelegramApi::new(SecretString::from(
            config.bot_token.clone(),
        )));

        // Wire the lifecycle manager with its own repository instances
        let lifecycle = Arc::new(SessionLifecycle::new(
            SqliteSessionRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            TelegramNotifier::new(api.clone()),
            TimeoutPolicy::from_minutes(config.session_timeout_minutes),
            SystemClock,
        ));

        Ok(Self {
            api,
            lifecycle,
            users: SqliteUserRepository::new(db_pool.clone()),
            messages: SqliteMessageRepository::new(db_pool),
            bot_name: config.bot_name.clone(),
        })
    }
}
