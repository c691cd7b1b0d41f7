//! Patient field extraction.
//!
//! Stably named fields are read by key; the supplemental attributes come from
//! the positional extension schema in [`crate::extension`]. Only `prefix`,
//! `deceasedDateTime` and `multipleBirthBoolean` may be absent.

use chrono::NaiveDate;
use serde_json::Value;

use fhirflat_model::constants::DEATH_NOT_APPLICABLE;
use fhirflat_model::{Address, PatientRecord, UniqueId};

use crate::error::ExtractionError;
use crate::extension::decode_extensions;
use crate::value::{invalid, optional_str, required_f64, required_str};

/// Maps a Patient resource to a [`PatientRecord`].
pub fn extract_patient(patient: &Value) -> Result<PatientRecord, ExtractionError> {
    let id = required_str(patient, "/id", "id")?;
    let unique_id = UniqueId::new(id.as_str()).map_err(|e| ExtractionError::InvalidValue {
        field: "id",
        value: id.clone(),
        reason: e.to_string(),
    })?;

    let extensions = decode_extensions(patient)?;

    Ok(PatientRecord {
        unique_id,
        given_name: given_name(patient)?,
        family_name: required_str(patient, "/name/0/family", "family_name")?,
        name_use: required_str(patient, "/name/0/use", "name_use")?,
        prefix: optional_str(patient, "/name/0/prefix/0", "prefix")?.unwrap_or_default(),
        birth_date: birth_date(patient)?,
        death_datetime: optional_str(patient, "/deceasedDateTime", "deceased_datetime")?
            .unwrap_or_else(|| DEATH_NOT_APPLICABLE.to_string()),
        birth_sex: extensions.birth_sex.clone(),
        gender: required_str(patient, "/gender", "gender")?,
        marital_status: required_str(patient, "/maritalStatus/text", "marital_status")?,
        mother: extensions.mother.clone(),
        race: extensions.race.clone(),
        ethnicity: extensions.ethnicity.clone(),
        address: address(patient)?,
        birthplace: extensions.birthplace(),
        multiple_birth: multiple_birth(patient)?,
        disability_adjusted_life_years: extensions.disability_adjusted_life_years,
        quality_adjusted_life_years: extensions.quality_adjusted_life_years,
    })
}

/// Joins the given-name fragments with single spaces.
fn given_name(patient: &Value) -> Result<String, ExtractionError> {
    let fragments = match patient.pointer("/name/0/given") {
        None | Some(Value::Null) => {
            return Err(ExtractionError::MissingField {
                field: "given_name",
            });
        }
        Some(Value::Array(fragments)) => fragments,
        Some(other) => return Err(invalid("given_name", other, "expected a list")),
    };
    let parts = fragments
        .iter()
        .map(|fragment| {
            fragment
                .as_str()
                .ok_or_else(|| invalid("given_name", fragment, "expected a string"))
        })
        .collect::<Result<Vec<&str>, _>>()?;
    if parts.is_empty() {
        return Err(ExtractionError::MissingField {
            field: "given_name",
        });
    }
    Ok(parts.join(" "))
}

fn birth_date(patient: &Value) -> Result<String, ExtractionError> {
    let raw = required_str(patient, "/birthDate", "birth_date")?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| ExtractionError::InvalidValue {
        field: "birth_date",
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    Ok(raw)
}

fn multiple_birth(patient: &Value) -> Result<String, ExtractionError> {
    match patient.get("multipleBirthBoolean") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(other) => Err(invalid("multiple_birth", other, "expected a boolean")),
    }
}

fn address(patient: &Value) -> Result<Address, ExtractionError> {
    let (latitude, longitude) = geolocation(patient)?;
    Ok(Address {
        line: required_str(patient, "/address/0/line/0", "address_line")?,
        city: required_str(patient, "/address/0/city", "address_city")?,
        state: required_str(patient, "/address/0/state", "address_state")?,
        country: required_str(patient, "/address/0/country", "address_country")?,
        latitude,
        longitude,
    })
}

/// Reads the `latitude`/`longitude` pair nested in the address extensions.
fn geolocation(patient: &Value) -> Result<(f64, f64), ExtractionError> {
    let coordinates: Vec<&Value> = patient
        .pointer("/address/0/extension")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|extension| extension.get("extension").and_then(Value::as_array))
        .flatten()
        .collect();
    let find = |url: &str, field: &'static str| {
        coordinates
            .iter()
            .find(|entry| entry.get("url").and_then(Value::as_str) == Some(url))
            .ok_or(ExtractionError::MissingField { field })
            .and_then(|entry| required_f64(entry, "/valueDecimal", field))
    };
    Ok((
        find("latitude", "address_latitude")?,
        find("longitude", "address_longitude")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> Value {
        json!({
            "resourceType": "Patient",
            "id": "5cbc121b-cd71-4428-b8b7-31e53eba8184",
            "extension": [
                {"extension": [{"valueCoding": {"display": "White"}}]},
                {"extension": [{"valueCoding": {"display": "Not Hispanic or Latino"}}]},
                {"valueString": "Nelda Mann"},
                {"valueCode": "M"},
                {"valueAddress": {"city": "Boston", "state": "Massachusetts", "country": "US"}},
                {"valueDecimal": 1.5},
                {"valueDecimal": 60.0}
            ],
            "name": [{"use": "official", "family": "O'Brien", "given": ["Mary", "Jane"], "prefix": ["Mrs."]}],
            "gender": "female",
            "birthDate": "1970-04-12",
            "maritalStatus": {"text": "M"},
            "address": [{
                "extension": [{"url": "geolocation", "extension": [
                    {"url": "latitude", "valueDecimal": 42.36},
                    {"url": "longitude", "valueDecimal": -71.05}
                ]}],
                "line": ["12 Main St"], "city": "Boston", "state": "MA", "country": "US"
            }],
            "deceasedDateTime": "2020-01-01T10:00:00-05:00",
            "multipleBirthBoolean": false
        })
    }

    #[test]
    fn extracts_named_and_positional_fields() {
        let record = extract_patient(&patient()).unwrap();
        assert_eq!(record.unique_id.as_str(), "5cbc121b-cd71-4428-b8b7-31e53eba8184");
        assert_eq!(record.given_name, "Mary Jane");
        assert_eq!(record.family_name, "O'Brien");
        assert_eq!(record.prefix, "Mrs.");
        assert_eq!(record.birth_sex, "M");
        assert_eq!(record.address.latitude, 42.36);
        assert_eq!(record.address.longitude, -71.05);
        assert_eq!(record.birthplace.state, "Massachusetts");
        assert_eq!(record.death_datetime, "2020-01-01T10:00:00-05:00");
        assert_eq!(record.multiple_birth, "false");
    }

    #[test]
    fn optional_fields_fall_back() {
        let mut value = patient();
        let object = value.as_object_mut().unwrap();
        object.remove("deceasedDateTime");
        object.remove("multipleBirthBoolean");
        value["name"][0].as_object_mut().unwrap().remove("prefix");

        let record = extract_patient(&value).unwrap();
        assert_eq!(record.death_datetime, "n/a");
        assert_eq!(record.prefix, "");
        assert_eq!(record.multiple_birth, "");
    }

    #[test]
    fn required_field_missing_fails() {
        let mut value = patient();
        value.as_object_mut().unwrap().remove("gender");
        assert_eq!(
            extract_patient(&value).unwrap_err(),
            ExtractionError::MissingField { field: "gender" }
        );
    }

    #[test]
    fn malformed_birth_date_fails() {
        let mut value = patient();
        value["birthDate"] = json!("12/04/1970");
        assert!(matches!(
            extract_patient(&value),
            Err(ExtractionError::InvalidValue {
                field: "birth_date",
                ..
            })
        ));
    }

    #[test]
    fn missing_geolocation_fails() {
        let mut value = patient();
        value["address"][0].as_object_mut().unwrap().remove("extension");
        assert_eq!(
            extract_patient(&value).unwrap_err(),
            ExtractionError::MissingField {
                field: "address_latitude"
            }
        );
    }

    #[test]
    fn empty_given_list_fails() {
        let mut value = patient();
        value["name"][0]["given"] = json!([]);
        assert_eq!(
            extract_patient(&value).unwrap_err(),
            ExtractionError::MissingField {
                field: "given_name"
            }
        );
    }
}
