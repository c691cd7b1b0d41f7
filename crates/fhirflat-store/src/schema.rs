//! Relational schema.
//!
//! `patient.unique_id` carries a UNIQUE constraint so that concurrent
//! ingestion of the same bundle stores at most one row; child tables
//! cascade on patient deletion.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

pub const PATIENT_TABLE: &str = "patient";
pub const CONTACT_TABLE: &str = "patient_contact";
pub const IDENTIFIER_TABLE: &str = "patient_identifier";
pub const LANGUAGE_TABLE: &str = "patient_language";
pub const EVENT_TABLE: &str = "patient_event";

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS patient (
    surrogate_id INTEGER PRIMARY KEY AUTOINCREMENT,
    unique_id TEXT NOT NULL UNIQUE,
    given_name TEXT NOT NULL,
    family_name TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    birth_sex TEXT NOT NULL,
    gender TEXT NOT NULL,
    mother TEXT NOT NULL,
    marital_status TEXT NOT NULL,
    name_use TEXT NOT NULL,
    address_line TEXT NOT NULL,
    address_city TEXT NOT NULL,
    address_state TEXT NOT NULL,
    address_country TEXT NOT NULL,
    address_latitude REAL NOT NULL,
    address_longitude REAL NOT NULL,
    birth_city TEXT NOT NULL,
    birth_state TEXT NOT NULL,
    birth_country TEXT NOT NULL,
    ethnicity TEXT NOT NULL,
    race TEXT NOT NULL,
    prefix TEXT NOT NULL,
    death_datetime TEXT NOT NULL,
    multiple_birth TEXT NOT NULL,
    disability_adjusted_life_years REAL NOT NULL,
    quality_adjusted_life_years REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS patient_contact (
    contact_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient(surrogate_id) ON DELETE CASCADE,
    contact_system TEXT NOT NULL,
    contact_use TEXT NOT NULL,
    contact_value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patient_identifier (
    identifier_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient(surrogate_id) ON DELETE CASCADE,
    identifier_system TEXT NOT NULL,
    identifier_type TEXT NOT NULL,
    identifier_value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patient_language (
    language_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient(surrogate_id) ON DELETE CASCADE,
    language TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patient_event (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient(surrogate_id) ON DELETE CASCADE,
    resource_type TEXT NOT NULL,
    payload TEXT NOT NULL CHECK (json_valid(payload))
);

CREATE INDEX IF NOT EXISTS patient_contact_patient ON patient_contact(patient_id);
CREATE INDEX IF NOT EXISTS patient_identifier_patient ON patient_identifier(patient_id);
CREATE INDEX IF NOT EXISTS patient_language_patient ON patient_language(patient_id);
CREATE INDEX IF NOT EXISTS patient_event_patient ON patient_event(patient_id);
";

/// Creates any missing table or index. Safe to run repeatedly.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(StoreError::statement("create schema"))
}
