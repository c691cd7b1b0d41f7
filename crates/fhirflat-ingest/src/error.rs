//! Error types for bundle ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, decoding, validating or
/// extracting a document.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a document file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Document Errors ===
    /// The byte stream is not well-formed JSON.
    #[error("{source_id} is in the wrong format: {source}")]
    Decode {
        source_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document does not open with a Patient resource.
    #[error("{source_id} is not a patient bundle: {reason}")]
    NotAPatientBundle { source_id: String, reason: String },

    /// A required patient field is missing or malformed.
    #[error("{source_id}: {source}")]
    Extraction {
        source_id: String,
        #[source]
        source: ExtractionError,
    },
}

/// Failures while mapping a validated patient resource to records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("invalid {field} value '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("extension array has {len} elements, '{field}' needs index {index}")]
    ExtensionTooShort {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("extension {index} does not carry a valid '{field}'")]
    InvalidExtension { field: &'static str, index: usize },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::NotAPatientBundle {
            source_id: "bundle.json".to_string(),
            reason: "first entry is Encounter".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "bundle.json is not a patient bundle: first entry is Encounter"
        );
    }

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::ExtensionTooShort {
            field: "quality_adjusted_life_years",
            index: 6,
            len: 5,
        };
        assert_eq!(
            err.to_string(),
            "extension array has 5 elements, 'quality_adjusted_life_years' needs index 6"
        );
    }
}
