//! Error types for the delivery statistics pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the delivery statistics pipeline.
///
/// Only failures that abort a file or a batch are represented here. Rows that
/// fail to parse are dropped and counted by the cleaner instead.
#[derive(Error, Debug)]
pub enum Error {
    /// A required column is missing after header normalization.
    #[error("Schema error in '{file}': missing column(s): {}", .missing.join(", "))]
    Schema {
        /// Label of the offending input (usually the file name).
        file: String,
        /// Canonical names of the missing fields.
        missing: Vec<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV reader error.
    #[error("CSV error in '{file}': {message}")]
    Csv {
        /// Label of the offending input.
        file: String,
        /// Reader message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a schema error for an input.
    pub fn schema(file: impl Into<String>, missing: Vec<String>) -> Self {
        Error::Schema {
            file: file.into(),
            missing,
        }
    }

    /// Create a CSV error for an input.
    pub fn csv(file: impl Into<String>, err: csv::Error) -> Self {
        Error::Csv {
            file: file.into(),
            message: err.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Names of the missing fields if this is a schema error.
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Error::Schema { missing, .. } => Some(missing),
            _ => None,
        }
    }
}
