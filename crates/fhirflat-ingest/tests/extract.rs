//! End-to-end extraction of a Synthea-style bundle.

use std::path::{Path, PathBuf};

use fhirflat_ingest::{
    ExtractionError, IngestError, extract_document, read_document, source_id,
};
use fhirflat_model::Collection;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/bundle.json")
}

#[test]
fn extracts_patient_children_and_events() {
    let path = fixture();
    let document = read_document(&path).expect("read fixture");
    let extracted = extract_document(&document, &source_id(&path)).expect("extract fixture");

    let patient = &extracted.patient;
    assert_eq!(patient.unique_id.as_str(), "8c95253e-8ee8-9ae8-6d40-021d702dc78e");
    assert_eq!(patient.given_name, "Mary Jane");
    assert_eq!(patient.family_name, "O'Brien");
    assert_eq!(patient.mother, "Kathleen O'Hara");
    assert_eq!(patient.race, "White");
    assert_eq!(patient.ethnicity, "Not Hispanic or Latino");
    assert_eq!(patient.birthplace.city, "Worcester");
    assert_eq!(patient.address.line, "868 Kuhic Gardens");
    assert_eq!(patient.death_datetime, "n/a");
    assert_eq!(patient.multiple_birth, "false");
    assert_eq!(patient.quality_adjusted_life_years, 52.268);

    assert_eq!(extracted.contacts.len(), 1);
    assert_eq!(extracted.identifiers.len(), 2);
    assert_eq!(extracted.identifiers[0].type_, "-");
    assert_eq!(extracted.languages[0].language, "English");

    let kinds: Vec<&str> = extracted
        .events
        .iter()
        .map(|event| event.resource_type())
        .collect();
    assert_eq!(kinds, vec!["Encounter", "Observation"]);

    // The SSN identifier has no value; the last entry has no resource.
    let skipped: Vec<(Collection, usize)> = extracted
        .skipped
        .iter()
        .map(|element| (element.collection, element.index))
        .collect();
    assert_eq!(
        skipped,
        vec![(Collection::Identifier, 2), (Collection::Event, 3)]
    );
}

#[test]
fn short_extension_array_fails_whole_document() {
    let mut document = read_document(&fixture()).expect("read fixture");
    document["entry"][0]["resource"]["extension"]
        .as_array_mut()
        .expect("extension array")
        .truncate(4);

    let err = extract_document(&document, "short.json").unwrap_err();
    match err {
        IngestError::Extraction { source_id, source } => {
            assert_eq!(source_id, "short.json");
            assert_eq!(
                source,
                ExtractionError::ExtensionTooShort {
                    field: "birthplace",
                    index: 4,
                    len: 4,
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_patient_bundle_is_rejected_before_extraction() {
    let mut document = read_document(&fixture()).expect("read fixture");
    document["entry"]
        .as_array_mut()
        .expect("entries")
        .remove(0);

    let err = extract_document(&document, "events-only.json").unwrap_err();
    assert!(matches!(err, IngestError::NotAPatientBundle { .. }));
}
