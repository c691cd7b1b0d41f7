//! Persistence error types.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The address is not a recognizable store location.
    #[error("invalid store address: {address:?}")]
    InvalidAddress { address: String },

    /// The store does not exist or cannot be opened.
    #[error("store {address} is unavailable: {source}")]
    Unavailable {
        address: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed to prepare or execute.
    #[error("failed to {operation}: {source}")]
    Statement {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// File system error while preparing the store location.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn statement(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Statement { operation, source }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
