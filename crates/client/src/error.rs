//! Client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the gateway and the typed API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session token was rejected and the refresh credential was too.
    /// The stored token has been cleared and the login redirect fired.
    #[error("authentication expired")]
    AuthExpired,

    /// A typed API call received a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// No response was obtained from the server.
    #[error("network error")]
    Network(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response body")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The persisted session entry could not be read or written.
    #[error("session storage error")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::AuthExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// Whether the failure happened before any response was obtained.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Transport(_))
    }
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
