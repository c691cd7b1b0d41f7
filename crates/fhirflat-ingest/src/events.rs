//! Event extraction: every non-Patient entry after the first.

use serde_json::Value;

use fhirflat_model::constants::PATIENT_RESOURCE_TYPE;
use fhirflat_model::{Collection, EventRecord, SkippedElement};

use crate::collections::SubCollection;

/// Keeps each non-Patient resource verbatim, tagged with its kind.
///
/// `entries` is the whole bundle entry list; the first entry (the patient)
/// is never considered. Skipped indices refer to positions in `entries`.
pub fn extract_events(entries: &[Value]) -> SubCollection<EventRecord> {
    let mut out = SubCollection::default();
    for (index, entry) in entries.iter().enumerate().skip(1) {
        let Some(resource) = entry.get("resource").filter(|r| r.is_object()) else {
            out.skipped.push(skipped(index, "entry has no resource"));
            continue;
        };
        let Some(kind) = resource.get("resourceType").and_then(Value::as_str) else {
            out.skipped.push(skipped(index, "resource has no resourceType"));
            continue;
        };
        if kind == PATIENT_RESOURCE_TYPE {
            continue;
        }
        match EventRecord::new(kind, resource.clone()) {
            Ok(event) => out.records.push(event),
            Err(error) => out.skipped.push(skipped(index, &error.to_string())),
        }
    }
    out
}

fn skipped(index: usize, reason: &str) -> SkippedElement {
    SkippedElement {
        collection: Collection::Event,
        index,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_non_patient_entries_in_order() {
        let entries = vec![
            json!({"resource": {"resourceType": "Patient", "id": "p"}}),
            json!({"resource": {"resourceType": "Encounter", "id": "e1"}}),
            json!({"resource": {"resourceType": "Patient", "id": "p2"}}),
            json!({"resource": {"resourceType": "Observation", "id": "o1", "valueQuantity": {"value": 1.5}}}),
        ];
        let events = extract_events(&entries);
        let kinds: Vec<&str> = events.records.iter().map(EventRecord::resource_type).collect();
        assert_eq!(kinds, vec!["Encounter", "Observation"]);
        assert_eq!(events.records[1].payload(), &entries[3]["resource"]);
        assert!(events.skipped.is_empty());
    }

    #[test]
    fn reports_entries_without_kind() {
        let entries = vec![
            json!({"resource": {"resourceType": "Patient"}}),
            json!({"fullUrl": "urn:uuid:1"}),
            json!({"resource": {"id": "x"}}),
            json!({"resource": {"resourceType": ""}}),
        ];
        let events = extract_events(&entries);
        assert!(events.records.is_empty());
        let indices: Vec<usize> = events.skipped.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn patient_only_bundle_has_no_events() {
        let entries = vec![json!({"resource": {"resourceType": "Patient"}})];
        assert!(extract_events(&entries).records.is_empty());
    }
}
