//! Record model shared by every stage of the bundle flattening pipeline.

pub mod constants;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod quoting;
pub mod records;

pub use error::{ModelError, Result};
pub use ids::{EventId, PatientId, UniqueId};
pub use outcome::{
    BatchSummary, DocumentOutcome, DocumentStage, DocumentStatus, ExportFailure, ExportSummary,
    SkipReason,
};
pub use quoting::escape_single_quotes;
pub use records::{
    Address, Birthplace, Collection, ContactRecord, EventRecord, ExtractedDocument,
    IdentifierRecord, LanguageRecord, PatientRecord, SkippedElement,
};
