//! Error types for schema loading, resolution and generation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generator operations
pub type GenResult<T> = Result<T, GenError>;

/// Error type for generator operations
#[derive(Error, Debug)]
pub enum GenError {
    /// A referenced type or its package cannot be located
    #[error("unresolved type '{type_name}' referenced from {referenced_from}")]
    UnresolvedType {
        type_name: String,
        referenced_from: String,
    },

    /// Malformed declaration, duplicate name or bad array length
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// Directory creation or file write failure
    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reading a schema file
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl GenError {
    /// Returns a stable code for the error kind
    pub fn error_code(&self) -> u32 {
        match self {
            GenError::UnresolvedType { .. } => 1,
            GenError::InvalidSpec(_) => 2,
            GenError::OutputWrite { .. } => 3,
            GenError::Io { .. } => 4,
            GenError::Config(_) => 5,
        }
    }

    /// Whether the error only affects the schema file being generated.
    ///
    /// Batch runs report resolution and spec errors and move on to the next
    /// file; I/O, output and config errors end the run.
    pub fn is_per_file(&self) -> bool {
        matches!(self, GenError::UnresolvedType { .. } | GenError::InvalidSpec(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GenError::InvalidSpec(message.into())
    }
}

impl From<toml::de::Error> for GenError {
    fn from(err: toml::de::Error) -> Self {
        GenError::Config(err.to_string())
    }
}

#[cfg(test)]
#[path = "error/error_tests.rs"]
mod error_tests;
