//! Error types and error handling for the docsearch service.
//!
//! This module defines the error taxonomy surfaced to callers. Native
//! engine errors are classified into these kinds by
//! [`crate::core::engine::classify`]; adapters (the CLI) decide how to
//! present them.

use thiserror::Error;

/// Result type alias for docsearch operations
pub type Result<T> = std::result::Result<T, DocSearchError>;

/// Main error type for the docsearch service
#[derive(Error, Debug)]
pub enum DocSearchError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported storage kind: {0}")]
    UnsupportedStorageKind(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DocSearchError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if retrying the same request may succeed.
    ///
    /// A resource-exhausted handle has already been evicted, so the next
    /// access opens a fresh one.
    pub fn is_transient(&self) -> bool {
        matches!(self, DocSearchError::ResourceExhausted(_))
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocSearchError::IndexNotFound(_))
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DocSearchError::InvalidDocument(_)
                | DocSearchError::UnsupportedStorageKind(_)
                | DocSearchError::MalformedQuery(_)
                | DocSearchError::ConfigError(_)
        )
    }
}
