//! Error types for uplink

use crate::directory::DirectoryError;
use std::io;
use thiserror::Error;

/// Uplink error type
#[derive(Error, Debug)]
pub enum UplinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// A link map line that could not be turned into a rule.
    #[error("Malformed rule '{text}': {reason}")]
    MalformedRule { text: String, reason: String },

    /// The directory could not answer right now (network, timeout).
    /// Resolution treats this as "no match" for the rule in question.
    #[error("Entity directory unavailable: {0}")]
    DirectoryTransient(DirectoryError),

    /// The directory rejected us outright (credentials, schema).
    /// Aborts resolution for the whole batch.
    #[error("Entity directory rejected the lookup: {0}")]
    DirectoryFatal(DirectoryError),

    #[error("Row {row} out of range for table with {len} rows")]
    StoreIndex { row: usize, len: usize },

    #[error("Column {column} out of range for table with {len} columns")]
    ColumnIndex { column: usize, len: usize },

    #[error("Column '{0}' is read-only")]
    ReadOnlyColumn(String),

    #[error("Upload failed for {path}: {reason}")]
    Upload { path: String, reason: String },
}

impl From<DirectoryError> for UplinkError {
    fn from(err: DirectoryError) -> Self {
        if err.is_transient() {
            UplinkError::DirectoryTransient(err)
        } else {
            UplinkError::DirectoryFatal(err)
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, UplinkError>;
