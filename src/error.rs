// src/error.rs

//! Error types for repository synchronization
//!
//! Every failure is fatal for the current run. Nothing here is retried
//! internally; re-invocation is left to the scheduler that started the run.

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching, indexing, or publishing packages
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (credentials, descriptor fields)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or transport failure while fetching an artifact
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Artifact could not be opened as a zip archive
    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive { path: String, reason: String },

    /// Artifact has no addon descriptor at the expected path
    #[error("Missing addon descriptor '{descriptor}' in {artifact}")]
    MissingDescriptor { artifact: String, descriptor: String },

    /// Addon descriptor could not be parsed or lacks required attributes
    #[error("Malformed addon descriptor: {0}")]
    MalformedDescriptor(String),

    /// Fetched artifact does not match the hash recorded in the manifest
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Version-control or pull-request collaborator failed
    #[error("Publish collaborator failed: {0}")]
    PublishCollaboratorError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Structured document (YAML, JSON) could not be read or written
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl Error {
    /// Whether this error marks the package itself as unpublishable
    pub fn is_invalid_package(&self) -> bool {
        matches!(
            self,
            Error::CorruptArchive { .. }
                | Error::MissingDescriptor { .. }
                | Error::MalformedDescriptor(_)
        )
    }
}
