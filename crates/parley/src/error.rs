//! Client error taxonomy.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the gateway and the controllers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials rejected or username conflict.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// Unknown identity or session.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure or malformed backend response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Empty input where non-empty is required.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Local identity store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Build an auth error with a backend-supplied reason.
    pub fn auth(reason: impl Into<String>) -> Self {
        ClientError::Auth {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}
