//! Normalized records produced from one patient bundle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::PATIENT_RESOURCE_TYPE;
use crate::{ModelError, UniqueId};

/// Home address of a patient, including its geolocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Place of birth carried by the birthplace extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Birthplace {
    pub city: String,
    pub state: String,
    pub country: String,
}

/// One patient row.
///
/// `prefix`, `death_datetime` and `multiple_birth` hold their fallback
/// literals when the source omits them; every other field was required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub unique_id: UniqueId,
    pub given_name: String,
    pub family_name: String,
    pub name_use: String,
    pub prefix: String,
    pub birth_date: String,
    pub death_datetime: String,
    pub birth_sex: String,
    pub gender: String,
    pub marital_status: String,
    pub mother: String,
    pub race: String,
    pub ethnicity: String,
    pub address: Address,
    pub birthplace: Birthplace,
    pub multiple_birth: String,
    pub disability_adjusted_life_years: f64,
    pub quality_adjusted_life_years: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub system: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub system: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub language: String,
}

/// A non-Patient bundle entry kept as an uninterpreted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    resource_type: String,
    payload: Value,
}

impl EventRecord {
    pub fn new(resource_type: impl Into<String>, payload: Value) -> Result<Self, ModelError> {
        let resource_type = resource_type.into();
        let trimmed = resource_type.trim();
        if trimmed.is_empty() || trimmed == PATIENT_RESOURCE_TYPE {
            return Err(ModelError::InvalidResourceType(resource_type));
        }
        Ok(Self {
            resource_type: trimmed.to_string(),
            payload,
        })
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Which repeated field a skipped element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Contact,
    Identifier,
    Language,
    Event,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Contact => "contact",
            Collection::Identifier => "identifier",
            Collection::Language => "language",
            Collection::Event => "event",
        }
    }
}

/// An element of a repeated field that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedElement {
    pub collection: Collection,
    pub index: usize,
    pub reason: String,
}

/// Everything extracted from one validated bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub patient: PatientRecord,
    pub contacts: Vec<ContactRecord>,
    pub identifiers: Vec<IdentifierRecord>,
    pub languages: Vec<LanguageRecord>,
    pub events: Vec<EventRecord>,
    pub skipped: Vec<SkippedElement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_rejects_patient_tag() {
        let err = EventRecord::new("Patient", json!({})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResourceType(_)));
    }

    #[test]
    fn event_rejects_blank_tag() {
        assert!(EventRecord::new("  ", json!({})).is_err());
    }

    #[test]
    fn event_keeps_payload_verbatim() {
        let payload = json!({"resourceType": "Encounter", "id": "e1"});
        let event = EventRecord::new("Encounter", payload.clone()).unwrap();
        assert_eq!(event.resource_type(), "Encounter");
        assert_eq!(event.payload(), &payload);
    }
}
