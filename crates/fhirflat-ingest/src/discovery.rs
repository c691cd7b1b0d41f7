//! Document discovery.

use std::path::{Path, PathBuf};

use fhirflat_model::constants::DOCUMENT_EXTENSION;

use crate::error::{IngestError, Result};

/// Files found directly inside an input directory.
#[derive(Debug, Clone, Default)]
pub struct DocumentListing {
    /// Files carrying the document extension, sorted by file name.
    pub documents: Vec<PathBuf>,
    /// Other regular files; reported and never opened.
    pub rejected: Vec<PathBuf>,
}

impl DocumentListing {
    /// Number of regular files seen.
    pub fn file_count(&self) -> usize {
        self.documents.len() + self.rejected.len()
    }
}

/// Lists candidate documents in a directory.
///
/// Sub-directories are ignored. Both lists are sorted by file name.
pub fn list_documents(dir: &Path) -> Result<DocumentListing> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut listing = DocumentListing::default();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if is_document(&path) {
            listing.documents.push(path);
        } else {
            listing.rejected.push(path);
        }
    }

    listing.documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    listing.rejected.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(listing)
}

/// Checks for the document extension (case-insensitive).
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

/// Identifier used to attribute errors to a document: its file name.
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}
