//! Typed error hierarchy for the task board client.
//!
//! Three top-level enums cover the three layers:
//! - `ApiError`: remote REST API failures
//! - `BoardError`: store, session and kanban failures surfaced to callers
//! - `ConfigError`: configuration file loading failures
//!
//! `TokenError` is shared by the first two: the API client reads the
//! persisted session token on every authenticated call.
//!
//! Looking up an unknown project or task id is never an error: local
//! mutations report absence through `Option`/`bool` return values.

use thiserror::Error;

use crate::board::models::TaskStatus;

/// Errors from the remote REST API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated: no session token is stored")]
    MissingToken,

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Invalid image upload: {0}")]
    InvalidUpload(String),

    #[error("Invalid resource id '{0}'")]
    InvalidResourceId(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ApiError {
    /// True when the backend rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

/// Errors surfaced by the store, session and kanban layers.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Task {task_id} is already being dragged")]
    DragInProgress { task_id: String },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Errors from reading or writing the persisted session token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to access session token at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed session token file at {path}: {source}")]
    Format {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BoardError {
    pub(crate) fn blank(field: &'static str) -> Self {
        BoardError::Validation {
            field,
            message: format!("{} must not be empty", field),
        }
    }

    /// Reject statuses outside the four board columns. Unknown statuses are
    /// tolerated when read from the server, never when set by a caller.
    pub(crate) fn check_status(status: &TaskStatus) -> Result<(), Self> {
        if status.is_column() {
            Ok(())
        } else {
            Err(BoardError::Validation {
                field: "status",
                message: format!("'{}' is not a board column", status),
            })
        }
    }
}

/// Errors from loading `taskboard.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
