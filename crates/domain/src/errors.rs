use std::fmt;
use thiserror::Error;

/// Status reported by the key-value backend.
///
/// `NotFound` is the only kind with naming semantics; every other kind is a
/// failure of the backend or of the path to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    NotFound,
    InvalidArgument,
    Unavailable,
    DeadlineExceeded,
    Cancelled,
    Internal,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::NotFound => "not found",
            BackendErrorKind::InvalidArgument => "invalid argument",
            BackendErrorKind::Unavailable => "unavailable",
            BackendErrorKind::DeadlineExceeded => "deadline exceeded",
            BackendErrorKind::Cancelled => "cancelled",
            BackendErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("backend {kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Internal, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == BackendErrorKind::NotFound
    }
}

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to decode record at {key}: {reason}")]
    RecordDecode { key: String, reason: String },

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Query cancelled")]
    QueryCancelled,

    #[error("No next handler found after {0}")]
    NoNextHandler(&'static str),

    #[error("Upstream lookup failed: {0}")]
    Upstream(String),

    #[error("Failed to write response: {0}")]
    ResponseWrite(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
