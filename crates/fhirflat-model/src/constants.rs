//! Literals shared between ingestion, persistence and export.

/// Kind tag of the resource that must open every bundle.
pub const PATIENT_RESOURCE_TYPE: &str = "Patient";

/// Extension (without the dot) of files treated as documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Stored in `death_datetime` when the patient has no `deceasedDateTime`.
pub const DEATH_NOT_APPLICABLE: &str = "n/a";

/// Stored in `patient_identifier.type` when the identifier has no type text.
pub const IDENTIFIER_TYPE_PLACEHOLDER: &str = "-";

/// Number of positional slots the patient `extension` array must carry.
pub const PATIENT_EXTENSION_COUNT: usize = 7;

/// File name of the per-patient summary written by the exporter.
pub const PATIENT_SUMMARY_FILE: &str = "patient_summary.csv";
