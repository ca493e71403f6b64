//! Error types for the liftlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Rejected user input (weight/reps, form fields, duplicate names)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation would break a store invariant
    #[error("Constraint error: {0}")]
    Constraint(String),

    /// Import document is not a valid export
    #[error("Format error: {0}")]
    Format(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store file management error
    #[error("State error: {0}")]
    State(String),
}

/// Coarse classification used by callers that only need to pick a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Constraint,
    Format,
    NotFound,
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Constraint(_) => ErrorKind::Constraint,
            Error::Format(_) => ErrorKind::Format,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::Toml(_)
            | Error::Config(_)
            | Error::State(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Error::Constraint(message.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }
}
