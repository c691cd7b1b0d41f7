//! CSV export of stored patients.
//!
//! Each patient gets a directory holding `patient_summary.csv` and one
//! `<event_id>_<ResourceType>.csv` per stored event, with the event payload
//! flattened into dotted columns.

pub mod error;
mod export;
pub mod layout;
pub mod payload;
pub mod writer;

pub use error::{ExportError, Result};
pub use export::export_patients;
pub use layout::{event_file_name, patient_dir_name};
pub use payload::{FlatTable, flatten_payload, flatten_stored_payload, restore_payload};
pub use writer::{write_event_csv, write_summary_csv};
