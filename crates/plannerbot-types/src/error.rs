use thiserror::Error;

/// Errors from repository operations (used by trait definitions in plannerbot-core).
///
/// "Session not found" and "user not found" are NOT errors -- repositories
/// signal absence with `Option`/`bool` results. These variants cover only
/// genuine store failures, which callers treat as retryable.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

/// Errors from the chat transport (Telegram Bot API).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),

    #[error("telegram api error: {description}")]
    Api { description: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}
