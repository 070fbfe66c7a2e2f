//! Error types for site-chat.

use thiserror::Error;

use crate::engine::EngineError;

/// Main error type for site-chat operations.
#[derive(Error, Debug)]
pub enum SiteChatError {
    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Session ID could not be parsed.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// Input arrived for a session that has no credential yet.
    #[error("an OpenAI API key must be set before using this session")]
    CredentialRequired,

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query engine setup failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Convenience Result type for site-chat operations.
pub type Result<T> = std::result::Result<T, SiteChatError>;
