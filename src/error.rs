//! Custom error types for intune-backup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Network failure, non-success status, or an unreadable response body
    #[error("Transport error: {0}")]
    Transport(String),

    /// Token acquisition or scope verification failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The caller lacks the permission required by an API action
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Folder creation or file write failed
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A whole category failed to export
    #[error("Category '{category}' failed: {source}")]
    Category {
        category: String,
        #[source]
        source: Box<BackupError>,
    },
}

impl BackupError {
    /// Wrap an error with the category it occurred in
    pub fn in_category(category: impl Into<String>, source: BackupError) -> Self {
        Self::Category {
            category: category.into(),
            source: Box::new(source),
        }
    }

    /// Filesystem errors abort the run; later categories write into the same tree
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Filesystem(_) => true,
            Self::Category { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Check if this is a permission error
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Filesystem(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::Error> for BackupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
