//! Bundle validation.

use serde_json::Value;

use fhirflat_model::constants::PATIENT_RESOURCE_TYPE;

use crate::error::{IngestError, Result};

/// A bundle whose first entry is known to hold a Patient resource.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedBundle<'a> {
    source_id: &'a str,
    patient: &'a Value,
    entries: &'a [Value],
}

impl<'a> ValidatedBundle<'a> {
    pub fn source_id(&self) -> &'a str {
        self.source_id
    }

    /// The Patient resource of the first entry.
    pub fn patient(&self) -> &'a Value {
        self.patient
    }

    /// All entries, the Patient entry included.
    pub fn entries(&self) -> &'a [Value] {
        self.entries
    }
}

/// Asserts that `document` is a bundle opening with a Patient resource.
pub fn validate_bundle<'a>(document: &'a Value, source_id: &'a str) -> Result<ValidatedBundle<'a>> {
    let reject = |reason: &str| IngestError::NotAPatientBundle {
        source_id: source_id.to_string(),
        reason: reason.to_string(),
    };

    let entries = document
        .get("entry")
        .and_then(Value::as_array)
        .ok_or_else(|| reject("no entry array"))?;
    let first = entries.first().ok_or_else(|| reject("entry array is empty"))?;
    let patient = first
        .get("resource")
        .filter(|resource| resource.is_object())
        .ok_or_else(|| reject("first entry has no resource"))?;

    match patient.get("resourceType").and_then(Value::as_str) {
        Some(PATIENT_RESOURCE_TYPE) => Ok(ValidatedBundle {
            source_id,
            patient,
            entries,
        }),
        Some(other) => Err(reject(&format!("first entry is {other}"))),
        None => Err(reject("first entry has no resourceType")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_patient_first() {
        let doc = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Encounter", "id": "e1"}}
        ]});
        let bundle = validate_bundle(&doc, "a.json").unwrap();
        assert_eq!(bundle.patient()["id"], "p1");
        assert_eq!(bundle.entries().len(), 2);
        assert_eq!(bundle.source_id(), "a.json");
    }

    #[test]
    fn rejects_other_first_resource() {
        let doc = json!({"entry": [{"resource": {"resourceType": "Encounter"}}]});
        let err = validate_bundle(&doc, "b.json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "b.json is not a patient bundle: first entry is Encounter"
        );
    }

    #[test]
    fn rejects_empty_and_missing_entries() {
        for doc in [json!({}), json!({"entry": []}), json!({"entry": {}}), json!([1, 2])] {
            let err = validate_bundle(&doc, "c.json").unwrap_err();
            assert!(matches!(err, IngestError::NotAPatientBundle { .. }));
        }
    }

    #[test]
    fn rejects_entry_without_resource() {
        let doc = json!({"entry": [{"fullUrl": "urn:uuid:1"}]});
        assert!(validate_bundle(&doc, "d.json").is_err());
    }
}
