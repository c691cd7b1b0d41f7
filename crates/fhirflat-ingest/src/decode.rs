//! Document decoding.

use std::path::Path;

use serde_json::Value;

use crate::discovery::source_id;
use crate::error::{IngestError, Result};

/// Decodes raw bytes into a JSON tree.
///
/// Malformed input yields [`IngestError::Decode`] tagged with `source_id`;
/// no partial tree is returned.
pub fn decode_document(bytes: &[u8], source_id: &str) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|source| IngestError::Decode {
        source_id: source_id.to_string(),
        source,
    })
}

/// Reads and decodes one document file.
pub fn read_document(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    decode_document(&bytes, &source_id(path))
}
