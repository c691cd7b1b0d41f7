//! Patient bundle ingestion: discovery, decoding, validation and extraction.

pub mod bundle;
pub mod collections;
pub mod decode;
pub mod discovery;
pub mod error;
pub mod events;
pub mod extension;
pub mod patient;
mod value;

use serde_json::Value;

use fhirflat_model::ExtractedDocument;

pub use bundle::{ValidatedBundle, validate_bundle};
pub use collections::{SubCollection, extract_contacts, extract_identifiers, extract_languages};
pub use decode::{decode_document, read_document};
pub use discovery::{DocumentListing, is_document, list_documents, source_id};
pub use error::{ExtractionError, IngestError, Result};
pub use events::extract_events;
pub use extension::{
    ExtensionSlot, PATIENT_EXTENSION_SCHEMA, PatientExtensions, decode_extensions,
};
pub use patient::extract_patient;

/// Runs every extractor over a validated bundle.
///
/// Fails only when the patient record itself cannot be built; malformed
/// sub-elements are collected in [`ExtractedDocument::skipped`].
pub fn extract_bundle(bundle: &ValidatedBundle<'_>) -> Result<ExtractedDocument> {
    let patient = bundle.patient();
    let record = extract_patient(patient).map_err(|source| IngestError::Extraction {
        source_id: bundle.source_id().to_string(),
        source,
    })?;

    let contacts = extract_contacts(patient);
    let identifiers = extract_identifiers(patient);
    let languages = extract_languages(patient);
    let events = extract_events(bundle.entries());

    let mut skipped = contacts.skipped;
    skipped.extend(identifiers.skipped);
    skipped.extend(languages.skipped);
    skipped.extend(events.skipped);

    Ok(ExtractedDocument {
        patient: record,
        contacts: contacts.records,
        identifiers: identifiers.records,
        languages: languages.records,
        events: events.records,
        skipped,
    })
}

/// Validates a decoded document and extracts it.
pub fn extract_document(document: &Value, source_id: &str) -> Result<ExtractedDocument> {
    let bundle = validate_bundle(document, source_id)?;
    extract_bundle(&bundle)
}
