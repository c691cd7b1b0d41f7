//! Repeated patient sub-fields: telecom, identifier, communication.
//!
//! A malformed element emits no record; it is reported as a
//! [`SkippedElement`] and the remaining elements are still extracted.

use serde_json::Value;

use fhirflat_model::constants::IDENTIFIER_TYPE_PLACEHOLDER;
use fhirflat_model::{Collection, ContactRecord, IdentifierRecord, LanguageRecord, SkippedElement};

use crate::error::ExtractionError;
use crate::value::{optional_str, required_str};

/// Records extracted from one repeated field plus the elements dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SubCollection<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedElement>,
}

impl<T> Default for SubCollection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// `telecom[]` → system, use, value (all required per element).
pub fn extract_contacts(patient: &Value) -> SubCollection<ContactRecord> {
    extract_each(patient, "telecom", Collection::Contact, |element| {
        Ok(ContactRecord {
            system: required_str(element, "/system", "system")?,
            use_: required_str(element, "/use", "use")?,
            value: required_str(element, "/value", "value")?,
        })
    })
}

/// `identifier[]` → system, type text (placeholder when absent), value.
pub fn extract_identifiers(patient: &Value) -> SubCollection<IdentifierRecord> {
    extract_each(patient, "identifier", Collection::Identifier, |element| {
        Ok(IdentifierRecord {
            system: required_str(element, "/system", "system")?,
            type_: optional_str(element, "/type/text", "type")?
                .unwrap_or_else(|| IDENTIFIER_TYPE_PLACEHOLDER.to_string()),
            value: required_str(element, "/value", "value")?,
        })
    })
}

/// `communication[]` → language text, or the first coding's display.
pub fn extract_languages(patient: &Value) -> SubCollection<LanguageRecord> {
    extract_each(patient, "communication", Collection::Language, |element| {
        let language = match optional_str(element, "/language/text", "language")? {
            Some(text) => text,
            None => required_str(element, "/language/coding/0/display", "language")?,
        };
        Ok(LanguageRecord { language })
    })
}

fn extract_each<T>(
    patient: &Value,
    key: &str,
    collection: Collection,
    map: impl Fn(&Value) -> Result<T, ExtractionError>,
) -> SubCollection<T> {
    let mut out = SubCollection::default();
    let elements = match patient.get(key) {
        None | Some(Value::Null) => return out,
        Some(Value::Array(elements)) => elements,
        Some(_) => {
            out.skipped.push(SkippedElement {
                collection,
                index: 0,
                reason: format!("'{key}' is not a list"),
            });
            return out;
        }
    };

    for (index, element) in elements.iter().enumerate() {
        match map(element) {
            Ok(record) => out.records.push(record),
            Err(error) => {
                tracing::debug!(
                    collection = collection.as_str(),
                    index,
                    %error,
                    "skipping malformed element"
                );
                out.skipped.push(SkippedElement {
                    collection,
                    index,
                    reason: error.to_string(),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contacts_skip_malformed_elements() {
        let patient = json!({"telecom": [
            {"system": "phone", "value": "555-123-4567", "use": "home"},
            {"system": "email", "value": "a@example.org"},
            {"system": "phone", "value": "555-987-6543", "use": "mobile"}
        ]});
        let contacts = extract_contacts(&patient);
        assert_eq!(contacts.records.len(), 2);
        assert_eq!(contacts.records[1].use_, "mobile");
        assert_eq!(contacts.skipped.len(), 1);
        assert_eq!(contacts.skipped[0].index, 1);
        assert_eq!(contacts.skipped[0].collection, Collection::Contact);
    }

    #[test]
    fn identifier_type_falls_back_to_placeholder() {
        let patient = json!({"identifier": [
            {"system": "https://github.com/synthetichealth/synthea", "value": "abc"},
            {"type": {"text": "Medical Record Number"}, "system": "http://hospital.example.org", "value": "mrn-1"}
        ]});
        let identifiers = extract_identifiers(&patient);
        assert!(identifiers.skipped.is_empty());
        assert_eq!(identifiers.records[0].type_, "-");
        assert_eq!(identifiers.records[1].type_, "Medical Record Number");
    }

    #[test]
    fn languages_use_text_then_coding_display() {
        let patient = json!({"communication": [
            {"language": {"text": "English"}},
            {"language": {"coding": [{"code": "es", "display": "Spanish"}]}},
            {"language": {}}
        ]});
        let languages = extract_languages(&patient);
        let labels: Vec<&str> = languages
            .records
            .iter()
            .map(|record| record.language.as_str())
            .collect();
        assert_eq!(labels, vec!["English", "Spanish"]);
        assert_eq!(languages.skipped.len(), 1);
    }

    #[test]
    fn missing_list_is_empty() {
        let collection = extract_contacts(&json!({}));
        assert!(collection.records.is_empty());
        assert!(collection.skipped.is_empty());
    }

    #[test]
    fn non_list_is_reported() {
        let collection = extract_identifiers(&json!({"identifier": {"value": "x"}}));
        assert!(collection.records.is_empty());
        assert_eq!(collection.skipped.len(), 1);
    }
}
