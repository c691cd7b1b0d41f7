//! JSON-pointer lookups with extraction errors attached.

use serde_json::Value;

use crate::error::ExtractionError;

/// Required string at `pointer`.
pub(crate) fn required_str(
    value: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<String, ExtractionError> {
    match value.pointer(pointer) {
        None | Some(Value::Null) => Err(ExtractionError::MissingField { field }),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(invalid(field, other, "expected a string")),
    }
}

/// Optional string at `pointer`; absent or null yields `None`.
pub(crate) fn optional_str(
    value: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<Option<String>, ExtractionError> {
    match value.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(invalid(field, other, "expected a string")),
    }
}

/// Required number at `pointer`.
pub(crate) fn required_f64(
    value: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<f64, ExtractionError> {
    match value.pointer(pointer) {
        None | Some(Value::Null) => Err(ExtractionError::MissingField { field }),
        Some(number) => number
            .as_f64()
            .ok_or_else(|| invalid(field, number, "expected a number")),
    }
}

pub(crate) fn invalid(field: &'static str, value: &Value, reason: &str) -> ExtractionError {
    ExtractionError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_lookups() {
        let value = json!({"name": [{"family": "Smith", "use": null}]});
        assert_eq!(
            required_str(&value, "/name/0/family", "family").unwrap(),
            "Smith"
        );
        assert_eq!(optional_str(&value, "/name/0/use", "use").unwrap(), None);
        assert_eq!(
            required_str(&value, "/name/0/given", "given").unwrap_err(),
            ExtractionError::MissingField { field: "given" }
        );
    }

    #[test]
    fn wrong_type_is_invalid() {
        let value = json!({"gender": 1, "lat": "north"});
        assert!(matches!(
            required_str(&value, "/gender", "gender"),
            Err(ExtractionError::InvalidValue { .. })
        ));
        assert!(matches!(
            required_f64(&value, "/lat", "latitude"),
            Err(ExtractionError::InvalidValue { .. })
        ));
    }
}
