//! CSV file writers.

use std::path::{Path, PathBuf};

use fhirflat_model::constants::PATIENT_SUMMARY_FILE;
use fhirflat_store::StoredPatient;

use crate::error::{ExportError, Result};
use crate::payload::FlatTable;

fn write_rows<'a>(
    path: &Path,
    header: &[String],
    rows: impl IntoIterator<Item = &'a Vec<String>>,
) -> Result<()> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        operation: "flush",
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the patient's stored columns as a header plus one row.
pub fn write_summary_csv(dir: &Path, patient: &StoredPatient) -> Result<PathBuf> {
    let path = dir.join(PATIENT_SUMMARY_FILE);
    write_rows(&path, &patient.columns, [&patient.values])?;
    Ok(path)
}

/// Writes a flattened event payload to `dir/file_name`.
pub fn write_event_csv(dir: &Path, file_name: &str, table: &FlatTable) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if table.columns.is_empty() {
        std::fs::File::create(&path).map_err(|source| ExportError::Io {
            operation: "create",
            path: path.clone(),
            source,
        })?;
        return Ok(path);
    }
    write_rows(&path, &table.columns, &table.rows)?;
    Ok(path)
}
