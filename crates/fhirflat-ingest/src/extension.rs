//! Positional schema of the patient `extension` array.
//!
//! The supplier addresses supplemental patient attributes by position rather
//! than by URL. The ordering is an external contract:
//!
//! | Index | Field | Source |
//! |-------|-------|--------|
//! | 0 | race | `extension[0].valueCoding.display` |
//! | 1 | ethnicity | `extension[0].valueCoding.display` |
//! | 2 | mother's maiden name | `valueString` |
//! | 3 | birth sex | `valueCode` |
//! | 4 | birthplace | `valueAddress` (city, state, country) |
//! | 5 | disability-adjusted life years | `valueDecimal` |
//! | 6 | quality-adjusted life years | `valueDecimal` |

use serde_json::Value;

use fhirflat_model::Birthplace;
use fhirflat_model::constants::PATIENT_EXTENSION_COUNT;

use crate::error::ExtractionError;

/// Values carried by the positional extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientExtensions {
    pub race: String,
    pub ethnicity: String,
    pub mother: String,
    pub birth_sex: String,
    pub birth_city: String,
    pub birth_state: String,
    pub birth_country: String,
    pub disability_adjusted_life_years: f64,
    pub quality_adjusted_life_years: f64,
}

impl PatientExtensions {
    pub fn birthplace(&self) -> Birthplace {
        Birthplace {
            city: self.birth_city.clone(),
            state: self.birth_state.clone(),
            country: self.birth_country.clone(),
        }
    }
}

type Apply = fn(&Value, &mut PatientExtensions) -> Option<()>;

/// One positional slot: where it sits, what it is called, how it decodes.
#[derive(Clone, Copy)]
pub struct ExtensionSlot {
    pub index: usize,
    pub field: &'static str,
    apply: Apply,
}

impl ExtensionSlot {
    /// Decodes `extension` into `target`; `None` when the shape is wrong.
    pub fn apply(&self, extension: &Value, target: &mut PatientExtensions) -> Option<()> {
        (self.apply)(extension, target)
    }
}

impl std::fmt::Debug for ExtensionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionSlot")
            .field("index", &self.index)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

pub static PATIENT_EXTENSION_SCHEMA: [ExtensionSlot; PATIENT_EXTENSION_COUNT] = [
    ExtensionSlot {
        index: 0,
        field: "race",
        apply: |ext, out| {
            out.race = coding_display(ext)?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 1,
        field: "ethnicity",
        apply: |ext, out| {
            out.ethnicity = coding_display(ext)?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 2,
        field: "mother",
        apply: |ext, out| {
            out.mother = string_at(ext, "/valueString")?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 3,
        field: "birth_sex",
        apply: |ext, out| {
            out.birth_sex = string_at(ext, "/valueCode")?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 4,
        field: "birthplace",
        apply: |ext, out| {
            out.birth_city = string_at(ext, "/valueAddress/city")?;
            out.birth_state = string_at(ext, "/valueAddress/state")?;
            out.birth_country = string_at(ext, "/valueAddress/country")?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 5,
        field: "disability_adjusted_life_years",
        apply: |ext, out| {
            out.disability_adjusted_life_years = ext.pointer("/valueDecimal")?.as_f64()?;
            Some(())
        },
    },
    ExtensionSlot {
        index: 6,
        field: "quality_adjusted_life_years",
        apply: |ext, out| {
            out.quality_adjusted_life_years = ext.pointer("/valueDecimal")?.as_f64()?;
            Some(())
        },
    },
];

/// Decodes every slot of the patient's extension array.
///
/// An array shorter than a slot's index fails with
/// [`ExtractionError::ExtensionTooShort`]; none of the slots has a fallback.
pub fn decode_extensions(patient: &Value) -> Result<PatientExtensions, ExtractionError> {
    let extensions = patient
        .get("extension")
        .and_then(Value::as_array)
        .ok_or(ExtractionError::MissingField { field: "extension" })?;

    let mut decoded = PatientExtensions::default();
    for slot in &PATIENT_EXTENSION_SCHEMA {
        let extension = extensions
            .get(slot.index)
            .ok_or(ExtractionError::ExtensionTooShort {
                field: slot.field,
                index: slot.index,
                len: extensions.len(),
            })?;
        slot.apply(extension, &mut decoded)
            .ok_or(ExtractionError::InvalidExtension {
                field: slot.field,
                index: slot.index,
            })?;
    }
    Ok(decoded)
}

fn coding_display(extension: &Value) -> Option<String> {
    string_at(extension, "/extension/0/valueCoding/display")
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extensions() -> Value {
        json!([
            {"url": "us-core-race", "extension": [
                {"url": "ombCategory", "valueCoding": {"code": "2106-3", "display": "White"}},
                {"url": "text", "valueString": "White"}
            ]},
            {"url": "us-core-ethnicity", "extension": [
                {"url": "ombCategory", "valueCoding": {"code": "2186-5", "display": "Not Hispanic or Latino"}}
            ]},
            {"url": "patient-mothersMaidenName", "valueString": "Nelda Mann"},
            {"url": "us-core-birthsex", "valueCode": "F"},
            {"url": "patient-birthPlace", "valueAddress": {"city": "Quincy", "state": "Massachusetts", "country": "US"}},
            {"url": "disability-adjusted-life-years", "valueDecimal": 0.5},
            {"url": "quality-adjusted-life-years", "valueDecimal": 41.25}
        ])
    }

    #[test]
    fn schema_is_ordered_by_index() {
        for (position, slot) in PATIENT_EXTENSION_SCHEMA.iter().enumerate() {
            assert_eq!(slot.index, position);
        }
        assert_eq!(PATIENT_EXTENSION_SCHEMA[3].field, "birth_sex");
    }

    #[test]
    fn decodes_all_slots() {
        let patient = json!({"extension": extensions()});
        let decoded = decode_extensions(&patient).unwrap();
        assert_eq!(decoded.race, "White");
        assert_eq!(decoded.ethnicity, "Not Hispanic or Latino");
        assert_eq!(decoded.mother, "Nelda Mann");
        assert_eq!(decoded.birth_sex, "F");
        assert_eq!(decoded.birthplace().city, "Quincy");
        assert_eq!(decoded.birth_country, "US");
        assert_eq!(decoded.disability_adjusted_life_years, 0.5);
        assert_eq!(decoded.quality_adjusted_life_years, 41.25);
    }

    #[test]
    fn short_array_fails_at_first_missing_slot() {
        let mut list = extensions();
        list.as_array_mut().unwrap().truncate(6);
        let patient = json!({"extension": list});
        assert_eq!(
            decode_extensions(&patient).unwrap_err(),
            ExtractionError::ExtensionTooShort {
                field: "quality_adjusted_life_years",
                index: 6,
                len: 6,
            }
        );
    }

    #[test]
    fn wrong_shape_at_slot_is_invalid() {
        let mut list = extensions();
        list[3] = json!({"url": "us-core-birthsex", "valueString": "F"});
        let patient = json!({"extension": list});
        assert_eq!(
            decode_extensions(&patient).unwrap_err(),
            ExtractionError::InvalidExtension {
                field: "birth_sex",
                index: 3,
            }
        );
    }

    #[test]
    fn missing_array_is_missing_field() {
        assert_eq!(
            decode_extensions(&json!({})).unwrap_err(),
            ExtractionError::MissingField { field: "extension" }
        );
    }
}
