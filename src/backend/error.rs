//! Document service error types

use thiserror::Error;

/// Service error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
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

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    #[allow(dead_code)] // Used by mocks
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Validation, message)
    }

    #[allow(dead_code)] // Used by mocks
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Server, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Unknown subject (404)
    NotFound,
    /// Rejected request (400, 422)
    Validation,
    /// Server error (5xx)
    Server,
    /// Anything else, including undecodable responses
    Unknown,
}

impl BackendErrorKind {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            404 => Self::NotFound,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}
