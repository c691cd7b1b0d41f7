//! Export error types.

use std::path::PathBuf;

use fhirflat_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The payload is not JSON, or has no tabular shape.
    #[error("cannot flatten payload: {reason}")]
    Flatten { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
