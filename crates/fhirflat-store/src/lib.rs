//! Relational persistence for flattened patient bundles.
//!
//! A [`PersistenceGateway`] stores one patient row per unique id plus its
//! contact, identifier, language and event rows, and reads them back for
//! export.

pub mod connection;
pub mod error;
pub mod gateway;
pub mod schema;
pub mod statement;

pub use connection::{ConnectionFactory, SqliteConnector, create_database};
pub use error::{Result, StoreError};
pub use gateway::{
    ChildCounts, ChildFailure, ChildInsertReport, ChildRow, PatientInsert, PersistenceGateway,
    StoredEvent, StoredPatient,
};
pub use schema::initialize_schema;
pub use statement::{InsertStatement, SqlValue, quote_text};
