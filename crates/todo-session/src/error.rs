use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage error: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("response channel error: {0}")]
pub struct ChannelError(pub String);

/// Failures inside the session manager. These are logged at the manager
/// boundary and never handed to callers.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status: {status} {body}")]
    Status { status: StatusCode, body: String },
    #[error("response did not contain a token")]
    MissingToken,
    #[error("server did not issue a refresh handle")]
    MissingRefreshHandle,
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("issued token is unreadable: {0}")]
    InvalidToken(String),
}

impl SessionError {
    /// Transport failures and 5xx answers are worth one more attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("session expired; login required")]
    ReauthenticationRequired,
    #[error("request failed: {status} {body}")]
    Status { status: StatusCode, body: String },
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::ReauthenticationRequired)
    }
}
