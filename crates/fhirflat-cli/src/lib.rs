//! Library side of the fhirflat CLI: logging setup and the ingestion pipeline.

pub mod logging;
pub mod pipeline;
