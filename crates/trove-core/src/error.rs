//! Unified error types for Trove.
//!
//! The repository layer produces exactly two kinds of failure:
//! [`ErrorKind::Repository`] for anything that went wrong talking to the
//! document store (or a query that cannot be executed), and
//! [`ErrorKind::Developer`] for a repository that was wired up without the
//! configuration it needs. Configuration and serialization kinds only show
//! up while the process is booting.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A document store operation failed, or the query could not be run.
    Repository,
    /// A repository is misconfigured. Requires a code fix, never a retry.
    Developer,
    /// Configuration could not be loaded.
    Configuration,
    /// A value could not be serialized or deserialized.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository => write!(f, "REPOSITORY"),
            Self::Developer => write!(f, "DEVELOPER"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified error used throughout Trove.
///
/// Store failures are never surfaced raw: the repository layer maps them
/// into an `AppError` with [`ErrorKind::Repository`] and keeps the driver
/// error as the `source`.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a repository error.
    pub fn repository(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Repository, message)
    }

    /// Create a developer (misconfiguration) error.
    pub fn developer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Developer, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether this error signals a programming mistake rather than a
    /// runtime or data failure.
    pub fn is_developer(&self) -> bool {
        self.kind == ErrorKind::Developer
    }

    /// Whether this error came from the repository layer's store boundary.
    pub fn is_repository(&self) -> bool {
        self.kind == ErrorKind::Repository
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
