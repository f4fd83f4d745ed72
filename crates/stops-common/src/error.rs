//! Error types for stopstats.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stopstats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for stopstats.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Source errors (20-29)
    #[error("failed to read source file {path}: {message}")]
    SourceRead { path: PathBuf, message: String },

    #[error("malformed source document {path}: {message}")]
    SourceMalformed { path: PathBuf, message: String },

    #[error("non-numeric value {value:?} for {category} in {entity}")]
    InvalidValue {
        entity: String,
        category: String,
        value: String,
    },

    // Output errors (40-49)
    #[error("failed to write output {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::SourceRead { .. } => 20,
            Error::SourceMalformed { .. } => 21,
            Error::InvalidValue { .. } => 22,
            Error::OutputWrite { .. } => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Whether the scan may continue past this error.
    ///
    /// Only output failures end a run; everything raised while reading
    /// source files is logged and the file skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::SourceRead { .. } | Error::SourceMalformed { .. } | Error::InvalidValue { .. }
        )
    }
}
