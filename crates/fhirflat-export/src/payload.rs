//! Event payload restoration and flattening.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{ExportError, Result};

/// XHTML narrative wrapper as it appears inside JSON string text.
const XHTML_DIV: &str = r#"<div xmlns=\"http://www.w3.org/1999/xhtml\">"#;

/// Strips the XHTML namespace from narrative wrappers.
///
/// Stored text already holds the original quotes; the engine consumed the
/// statement escaping when the row was written.
pub fn restore_payload(text: &str) -> String {
    text.replace(XHTML_DIV, "<div>")
}

/// Rows of string cells under a shared header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Default)]
struct TableBuilder {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    fn push_row(&mut self, cells: Vec<(String, String)>) {
        let mut row = vec![String::new(); self.columns.len()];
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (path, cell) in cells {
            // A dotted key and a nested path can flatten to the same name.
            let occurrence = seen.entry(path.clone()).or_default();
            *occurrence += 1;
            let column = if *occurrence == 1 {
                path
            } else {
                format!("{path}#{occurrence}")
            };
            let position = match self.positions.get(&column) {
                Some(position) => *position,
                None => {
                    let position = self.columns.len();
                    self.positions.insert(column.clone(), position);
                    self.columns.push(column);
                    position
                }
            };
            if position >= row.len() {
                row.resize(position + 1, String::new());
            }
            row[position] = cell;
        }
        self.rows.push(row);
    }

    fn finish(mut self) -> FlatTable {
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        FlatTable {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Flattens an object into one row, or an array of objects into one row each.
///
/// Nested objects become `parent.child` columns and arrays `parent.<index>`
/// columns. Columns are the union across rows in first-seen order. A path
/// repeated within one row gets a `#<n>` suffix from its second occurrence on.
pub fn flatten_payload(payload: &Value) -> Result<FlatTable> {
    let mut builder = TableBuilder::default();
    match payload {
        Value::Object(object) => builder.push_row(flatten_object(object)),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let Value::Object(object) = item else {
                    return Err(ExportError::Flatten {
                        reason: format!("array element {index} is not an object"),
                    });
                };
                builder.push_row(flatten_object(object));
            }
        }
        other => {
            return Err(ExportError::Flatten {
                reason: format!("top-level {} has no columns", kind(other)),
            });
        }
    }
    Ok(builder.finish())
}

/// Restores, parses and flattens stored payload text.
pub fn flatten_stored_payload(text: &str) -> Result<FlatTable> {
    let restored = restore_payload(text);
    let payload: Value = serde_json::from_str(&restored).map_err(|err| ExportError::Flatten {
        reason: format!("payload is not valid JSON: {err}"),
    })?;
    flatten_payload(&payload)
}

fn flatten_object(object: &Map<String, Value>) -> Vec<(String, String)> {
    let mut cells = Vec::new();
    for (key, value) in object {
        flatten_value(key.clone(), value, &mut cells);
    }
    cells
}

fn flatten_value(path: String, value: &Value, cells: &mut Vec<(String, String)>) {
    match value {
        Value::Object(object) if object.is_empty() => cells.push((path, "{}".to_string())),
        Value::Array(items) if items.is_empty() => cells.push((path, "[]".to_string())),
        Value::Object(object) => {
            for (key, child) in object {
                flatten_value(format!("{path}.{key}"), child, cells);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_value(format!("{path}.{index}"), child, cells);
            }
        }
        Value::Null => cells.push((path, String::new())),
        Value::String(text) => cells.push((path, text.clone())),
        Value::Bool(flag) => cells.push((path, flag.to_string())),
        Value::Number(number) => cells.push((path, number.to_string())),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn restores_narrative_wrapper_and_keeps_quotes() {
        let stored = r#"{"text":{"div":"<div xmlns=\"http://www.w3.org/1999/xhtml\">Mary''s visit</div>"}}"#;
        assert_eq!(
            restore_payload(stored),
            r#"{"text":{"div":"<div>Mary''s visit</div>"}}"#
        );
    }

    #[test]
    fn nested_object_becomes_dotted_columns() {
        let payload = json!({
            "resourceType": "Encounter",
            "id": "e1",
            "class": {"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB"},
            "type": [{"text": "Well child visit"}],
            "period": {},
            "participant": [],
            "serviceProvider": null,
            "length": 15.5,
            "active": true
        });
        let table = flatten_payload(&payload).unwrap();
        insta::assert_snapshot!(table.columns.join("\n"), @r"
        resourceType
        id
        class.system
        class.code
        type.0.text
        period
        participant
        serviceProvider
        length
        active
        ");
        assert_eq!(
            table.rows,
            vec![vec![
                "Encounter",
                "e1",
                "http://terminology.hl7.org/CodeSystem/v3-ActCode",
                "AMB",
                "Well child visit",
                "{}",
                "[]",
                "",
                "15.5",
                "true",
            ]]
        );
    }

    #[test]
    fn array_of_objects_unions_columns() {
        let payload = json!([
            {"code": "8302-2", "value": 176.4},
            {"code": "29463-7", "unit": "kg", "value": 81.2}
        ]);
        let table = flatten_payload(&payload).unwrap();
        insta::assert_snapshot!(table.columns.join(","), @"code,value,unit");
        assert_eq!(table.rows[0], vec!["8302-2", "176.4", ""]);
        assert_eq!(table.rows[1], vec!["29463-7", "81.2", "kg"]);
    }

    #[test]
    fn dotted_key_does_not_overwrite_nested_path() {
        let table = flatten_payload(&json!({"a.b": "x", "a": {"b": "y"}})).unwrap();
        insta::assert_snapshot!(table.columns.join(","), @"a.b,a.b#2");
        assert_eq!(table.rows, vec![vec!["x", "y"]]);
    }

    #[test]
    fn scalars_cannot_be_flattened() {
        assert!(matches!(
            flatten_payload(&json!("note")),
            Err(ExportError::Flatten { .. })
        ));
        assert!(matches!(
            flatten_payload(&json!([{"a": 1}, 2])),
            Err(ExportError::Flatten { .. })
        ));
    }

    #[test]
    fn stored_text_must_parse() {
        let err = flatten_stored_payload("{not json").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
        let table = flatten_stored_payload(r#"{"note":"Joe's ''quoted''"}"#).unwrap();
        assert_eq!(table.rows[0], vec!["Joe's ''quoted''"]);
    }
}
