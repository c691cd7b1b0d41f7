//! Textual statement rendering.
//!
//! Every text literal goes through [`escape_single_quotes`] before it is
//! embedded, so values such as `O'Brien` produce well-formed statements and
//! are stored unchanged.

use fhirflat_model::escape_single_quotes;

/// A literal to embed in a rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Real(f64),
    Integer(i64),
    /// JSON document text, stored through the engine's `json()` function.
    Json(String),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => quote_text(text),
            Self::Real(value) if value.is_finite() => format!("{value:?}"),
            Self::Real(_) => "NULL".to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Json(text) => format!("json({})", quote_text(text)),
        }
    }
}

/// Renders `value` as a single-quoted SQL string literal.
pub fn quote_text(value: &str) -> String {
    format!("'{}'", escape_single_quotes(value))
}

/// Builder for a single-row `INSERT`.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: &'static str,
    columns: Vec<(&'static str, SqlValue)>,
    conflict_target: Option<&'static str>,
}

impl InsertStatement {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            conflict_target: None,
        }
    }

    #[must_use]
    pub fn value(mut self, column: &'static str, value: SqlValue) -> Self {
        self.columns.push((column, value));
        self
    }

    #[must_use]
    pub fn text(self, column: &'static str, value: &str) -> Self {
        self.value(column, SqlValue::text(value))
    }

    /// Turns a uniqueness conflict on `column` into a no-op insert.
    #[must_use]
    pub fn on_conflict_do_nothing(mut self, column: &'static str) -> Self {
        self.conflict_target = Some(column);
        self
    }

    pub fn render(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|(name, _)| *name).collect();
        let values: Vec<String> = self.columns.iter().map(|(_, value)| value.render()).collect();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            values.join(", ")
        );
        if let Some(target) = self.conflict_target {
            sql.push_str(&format!(" ON CONFLICT({target}) DO NOTHING"));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_literals_are_escaped() {
        assert_eq!(quote_text("O'Brien"), "'O''Brien'");
        assert_eq!(SqlValue::text("it's").render(), "'it''s'");
    }

    #[test]
    fn numbers_and_json_render() {
        assert_eq!(SqlValue::Real(42.5).render(), "42.5");
        assert_eq!(SqlValue::Real(60.0).render(), "60.0");
        assert_eq!(SqlValue::Real(f64::NAN).render(), "NULL");
        assert_eq!(SqlValue::Integer(-3).render(), "-3");
        assert_eq!(
            SqlValue::Json(r#"{"note":"Joe's"}"#.to_string()).render(),
            r#"json('{"note":"Joe''s"}')"#
        );
    }

    #[test]
    fn insert_keeps_column_order() {
        let sql = InsertStatement::new("patient_language")
            .value("patient_id", SqlValue::Integer(7))
            .text("language", "Gàidhlig")
            .render();
        assert_eq!(
            sql,
            "INSERT INTO patient_language (patient_id, language) VALUES (7, 'Gàidhlig')"
        );
    }

    #[test]
    fn renders_insert_with_conflict_clause() {
        let sql = InsertStatement::new("patient")
            .text("unique_id", "p-1")
            .text("family_name", "D'Arcy")
            .value("address_latitude", SqlValue::Real(1.25))
            .on_conflict_do_nothing("unique_id")
            .render();
        assert_eq!(
            sql,
            "INSERT INTO patient (unique_id, family_name, address_latitude) \
             VALUES ('p-1', 'D''Arcy', 1.25) ON CONFLICT(unique_id) DO NOTHING"
        );
    }
}
