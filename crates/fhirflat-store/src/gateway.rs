//! Persistence gateway over a [`ConnectionFactory`].
//!
//! Each public operation acquires its own connection and drops it before
//! returning. Child collections are inserted row by row without a spanning
//! transaction, so a failed row never removes its siblings or the parent.

use fhirflat_model::{
    Collection, ContactRecord, EventId, EventRecord, IdentifierRecord, LanguageRecord, PatientId,
    PatientRecord, UniqueId,
};
use rusqlite::types::ValueRef;

use crate::connection::ConnectionFactory;
use crate::error::{Result, StoreError};
use crate::schema::{CONTACT_TABLE, EVENT_TABLE, IDENTIFIER_TABLE, LANGUAGE_TABLE, PATIENT_TABLE};
use crate::statement::{InsertStatement, SqlValue};

/// Result of a patient insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientInsert {
    Inserted(PatientId),
    /// A row with the same unique id already exists; nothing was written.
    Duplicate,
}

/// A child row that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildFailure {
    /// Position in the collection, or `None` when no connection was acquired.
    pub index: Option<usize>,
    pub message: String,
}

/// Outcome of inserting one child collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInsertReport {
    pub collection: Collection,
    pub attempted: usize,
    pub inserted: usize,
    pub failures: Vec<ChildFailure>,
}

impl ChildInsertReport {
    fn new(collection: Collection, attempted: usize) -> Self {
        Self {
            collection,
            attempted,
            inserted: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure lines in the form `contact[1]: <message>`.
    pub fn failure_messages(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|failure| match failure.index {
                Some(index) => format!("{}[{index}]: {}", self.collection.as_str(), failure.message),
                None => format!("{}: {}", self.collection.as_str(), failure.message),
            })
            .collect()
    }
}

/// Row counts of every child table for one patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildCounts {
    pub contacts: usize,
    pub identifiers: usize,
    pub languages: usize,
    pub events: usize,
}

/// A patient row read back as text, in stored column order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPatient {
    pub id: PatientId,
    pub unique_id: String,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl StoredPatient {
    pub fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub event_id: EventId,
    pub resource_type: String,
    pub payload: String,
}

/// A record that belongs to a patient and is stored in a child table.
pub trait ChildRow {
    const COLLECTION: Collection;

    fn statement(&self, patient: PatientId) -> InsertStatement;
}

impl ChildRow for ContactRecord {
    const COLLECTION: Collection = Collection::Contact;

    fn statement(&self, patient: PatientId) -> InsertStatement {
        InsertStatement::new(CONTACT_TABLE)
            .value("patient_id", SqlValue::Integer(patient.get()))
            .text("contact_system", &self.system)
            .text("contact_use", &self.use_)
            .text("contact_value", &self.value)
    }
}

impl ChildRow for IdentifierRecord {
    const COLLECTION: Collection = Collection::Identifier;

    fn statement(&self, patient: PatientId) -> InsertStatement {
        InsertStatement::new(IDENTIFIER_TABLE)
            .value("patient_id", SqlValue::Integer(patient.get()))
            .text("identifier_system", &self.system)
            .text("identifier_type", &self.type_)
            .text("identifier_value", &self.value)
    }
}

impl ChildRow for LanguageRecord {
    const COLLECTION: Collection = Collection::Language;

    fn statement(&self, patient: PatientId) -> InsertStatement {
        InsertStatement::new(LANGUAGE_TABLE)
            .value("patient_id", SqlValue::Integer(patient.get()))
            .text("language", &self.language)
    }
}

impl ChildRow for EventRecord {
    const COLLECTION: Collection = Collection::Event;

    fn statement(&self, patient: PatientId) -> InsertStatement {
        InsertStatement::new(EVENT_TABLE)
            .value("patient_id", SqlValue::Integer(patient.get()))
            .text("resource_type", self.resource_type())
            .value("payload", SqlValue::Json(self.payload().to_string()))
    }
}

fn patient_statement(record: &PatientRecord) -> InsertStatement {
    InsertStatement::new(PATIENT_TABLE)
        .text("unique_id", record.unique_id.as_str())
        .text("given_name", &record.given_name)
        .text("family_name", &record.family_name)
        .text("birth_date", &record.birth_date)
        .text("birth_sex", &record.birth_sex)
        .text("gender", &record.gender)
        .text("mother", &record.mother)
        .text("marital_status", &record.marital_status)
        .text("name_use", &record.name_use)
        .text("address_line", &record.address.line)
        .text("address_city", &record.address.city)
        .text("address_state", &record.address.state)
        .text("address_country", &record.address.country)
        .value("address_latitude", SqlValue::Real(record.address.latitude))
        .value("address_longitude", SqlValue::Real(record.address.longitude))
        .text("birth_city", &record.birthplace.city)
        .text("birth_state", &record.birthplace.state)
        .text("birth_country", &record.birthplace.country)
        .text("ethnicity", &record.ethnicity)
        .text("race", &record.race)
        .text("prefix", &record.prefix)
        .text("death_datetime", &record.death_datetime)
        .text("multiple_birth", &record.multiple_birth)
        .value(
            "disability_adjusted_life_years",
            SqlValue::Real(record.disability_adjusted_life_years),
        )
        .value(
            "quality_adjusted_life_years",
            SqlValue::Real(record.quality_adjusted_life_years),
        )
        .on_conflict_do_nothing("unique_id")
}

fn value_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => format!("{number:?}"),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Store operations used by ingestion and export.
#[derive(Debug, Clone)]
pub struct PersistenceGateway<F> {
    factory: F,
}

impl<F: ConnectionFactory> PersistenceGateway<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn address(&self) -> &str {
        self.factory.address()
    }

    /// Looks up the surrogate id stored for `unique_id`.
    pub fn find_patient(&self, unique_id: &UniqueId) -> Result<Option<PatientId>> {
        let conn = self.factory.connect()?;
        let result = conn.query_row(
            "SELECT surrogate_id FROM patient WHERE unique_id = ?1",
            [unique_id.as_str()],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(id) => Ok(Some(PatientId::new(id))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(source) => Err(StoreError::Statement {
                operation: "look up patient",
                source,
            }),
        }
    }

    /// Inserts the patient row unless its unique id is already stored.
    pub fn insert_patient(&self, record: &PatientRecord) -> Result<PatientInsert> {
        let sql = patient_statement(record).render();
        let conn = self.factory.connect()?;
        let changed = conn
            .execute(&sql, ())
            .map_err(StoreError::statement("insert patient"))?;
        if changed == 0 {
            tracing::debug!(unique_id = %record.unique_id, "patient already stored");
            return Ok(PatientInsert::Duplicate);
        }
        let id = PatientId::new(conn.last_insert_rowid());
        tracing::debug!(patient_id = %id, "patient row inserted");
        Ok(PatientInsert::Inserted(id))
    }

    pub fn insert_contacts(&self, patient: PatientId, rows: &[ContactRecord]) -> ChildInsertReport {
        self.insert_children(patient, rows)
    }

    pub fn insert_identifiers(
        &self,
        patient: PatientId,
        rows: &[IdentifierRecord],
    ) -> ChildInsertReport {
        self.insert_children(patient, rows)
    }

    pub fn insert_languages(&self, patient: PatientId, rows: &[LanguageRecord]) -> ChildInsertReport {
        self.insert_children(patient, rows)
    }

    pub fn insert_events(&self, patient: PatientId, rows: &[EventRecord]) -> ChildInsertReport {
        self.insert_children(patient, rows)
    }

    fn insert_children<R: ChildRow>(&self, patient: PatientId, rows: &[R]) -> ChildInsertReport {
        let mut report = ChildInsertReport::new(R::COLLECTION, rows.len());
        if rows.is_empty() {
            return report;
        }
        let conn = match self.factory.connect() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(
                    collection = R::COLLECTION.as_str(),
                    patient_id = %patient,
                    error = %err,
                    "no connection for child rows"
                );
                report.failures.push(ChildFailure {
                    index: None,
                    message: err.to_string(),
                });
                return report;
            }
        };
        for (index, row) in rows.iter().enumerate() {
            let sql = row.statement(patient).render();
            match conn.execute(&sql, ()) {
                Ok(_) => report.inserted += 1,
                Err(err) => {
                    tracing::warn!(
                        collection = R::COLLECTION.as_str(),
                        patient_id = %patient,
                        index,
                        error = %err,
                        "child row not stored"
                    );
                    report.failures.push(ChildFailure {
                        index: Some(index),
                        message: err.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Every stored patient, ordered by surrogate id.
    pub fn list_patients(&self) -> Result<Vec<StoredPatient>> {
        let conn = self.factory.connect()?;
        let mut stmt = conn
            .prepare("SELECT * FROM patient ORDER BY surrogate_id")
            .map_err(StoreError::statement("list patients"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();
        let rows = stmt
            .query_map((), |row| {
                let id: i64 = row.get("surrogate_id")?;
                let values = (0..column_count)
                    .map(|index| row.get_ref(index).map(value_text))
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok((id, values))
            })
            .map_err(StoreError::statement("list patients"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::statement("read patient row"))?;

        let column_text = |values: &[String], name: &str| {
            columns
                .iter()
                .position(|column| column == name)
                .and_then(|index| values.get(index))
                .cloned()
                .unwrap_or_default()
        };
        Ok(rows
            .into_iter()
            .map(|(id, values)| StoredPatient {
                id: PatientId::new(id),
                unique_id: column_text(&values, "unique_id"),
                given_name: column_text(&values, "given_name"),
                family_name: column_text(&values, "family_name"),
                birth_date: column_text(&values, "birth_date"),
                columns: columns.clone(),
                values,
            })
            .collect())
    }

    /// Events of one patient, ordered by event id.
    pub fn list_events(&self, patient: PatientId) -> Result<Vec<StoredEvent>> {
        let conn = self.factory.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT event_id, resource_type, payload FROM patient_event \
                 WHERE patient_id = ?1 ORDER BY event_id",
            )
            .map_err(StoreError::statement("list events"))?;
        stmt.query_map([patient.get()], |row| {
            Ok(StoredEvent {
                event_id: EventId::new(row.get(0)?),
                resource_type: row.get(1)?,
                payload: row.get(2)?,
            })
        })
        .map_err(StoreError::statement("list events"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::statement("read event row"))
    }

    pub fn child_counts(&self, patient: PatientId) -> Result<ChildCounts> {
        let conn = self.factory.connect()?;
        let count = |table: &str| -> Result<usize> {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE patient_id = ?1");
            conn.query_row(&sql, [patient.get()], |row| row.get::<_, i64>(0))
                .map(|count| usize::try_from(count).unwrap_or_default())
                .map_err(StoreError::statement("count child rows"))
        };
        Ok(ChildCounts {
            contacts: count(CONTACT_TABLE)?,
            identifiers: count(IDENTIFIER_TABLE)?,
            languages: count(LANGUAGE_TABLE)?,
            events: count(EVENT_TABLE)?,
        })
    }

    pub fn patient_count(&self) -> Result<usize> {
        let conn = self.factory.connect()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM patient", (), |row| row.get(0))
            .map_err(StoreError::statement("count patients"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
