//! Document ingestion pipeline.
//!
//! Each document moves through read, decode, validate, extract and persist,
//! and settles as persisted, skipped or failed. A document's failure never
//! stops the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{Span, debug, info, info_span, warn};

use fhirflat_ingest::{IngestError, extract_document, list_documents, read_document, source_id};
use fhirflat_model::{
    BatchSummary, DocumentOutcome, DocumentStage, ExtractedDocument, SkipReason,
};
use fhirflat_store::{ConnectionFactory, PatientInsert, PersistenceGateway};

use crate::logging::redact_value;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Worker threads; 1 processes documents in listing order on the caller.
    pub jobs: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// Settled outcomes of one directory.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub input_dir: PathBuf,
    /// One outcome per document, in listing order.
    pub outcomes: Vec<DocumentOutcome>,
    pub summary: BatchSummary,
    /// Files without the document extension; never opened.
    pub rejected: Vec<PathBuf>,
}

impl BatchResult {
    pub fn has_failures(&self) -> bool {
        self.summary.has_failures()
    }
}

/// Ingests every document in `dir`.
///
/// # Errors
///
/// Returns an error only when the directory cannot be listed.
pub fn ingest_directory<F: ConnectionFactory>(
    dir: &Path,
    gateway: &PersistenceGateway<F>,
    options: IngestOptions,
) -> Result<BatchResult> {
    let batch_span = info_span!("ingest", input = %dir.display());
    let _batch_guard = batch_span.enter();

    let listing =
        list_documents(dir).with_context(|| format!("list documents in {}", dir.display()))?;
    info!(
        files = listing.file_count(),
        documents = listing.documents.len(),
        "files found"
    );
    for path in &listing.rejected {
        warn!(file = %source_id(path), "not a .json file, skipped");
    }

    let outcomes = run_documents(&listing.documents, gateway, options.jobs);
    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        persisted = summary.persisted,
        skipped = summary.skipped,
        failed = summary.failed,
        "loaded {} of {} documents",
        summary.persisted,
        summary.total
    );

    Ok(BatchResult {
        input_dir: dir.to_path_buf(),
        outcomes,
        summary,
        rejected: listing.rejected,
    })
}

fn run_documents<F: ConnectionFactory>(
    paths: &[PathBuf],
    gateway: &PersistenceGateway<F>,
    jobs: usize,
) -> Vec<DocumentOutcome> {
    let workers = jobs.max(1).min(paths.len());
    if workers <= 1 {
        return paths
            .iter()
            .map(|path| ingest_document(path, gateway))
            .collect();
    }
    debug!(workers, "ingesting on worker threads");
    settle_on_workers(paths, workers, |path| ingest_document(path, gateway))
}

/// Runs `settle` over `paths` on `workers` scoped threads.
///
/// Outcomes are sent back as each document settles, so a panicking worker
/// loses only the document it was holding. Documents left unsettled are
/// reported as failed at the read stage.
fn settle_on_workers<W>(paths: &[PathBuf], workers: usize, settle: W) -> Vec<DocumentOutcome>
where
    W: Fn(&Path) -> DocumentOutcome + Sync,
{
    let cursor = AtomicUsize::new(0);
    let parent = Span::current();
    let (sender, receiver) = mpsc::channel();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let sender = sender.clone();
                let (cursor, parent, settle) = (&cursor, &parent, &settle);
                scope.spawn(move || {
                    let _guard = parent.enter();
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(index) else {
                            break;
                        };
                        if sender.send((index, settle(path))).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("ingest worker panicked");
            }
        }
    });
    drop(sender);

    let mut slots: Vec<Option<DocumentOutcome>> = vec![None; paths.len()];
    for (index, outcome) in receiver {
        slots[index] = Some(outcome);
    }
    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                DocumentOutcome::failed(source_id(path), DocumentStage::Read, "worker panicked")
            })
        })
        .collect()
}

/// Ingests one document. Every error is folded into the outcome.
pub fn ingest_document<F: ConnectionFactory>(
    path: &Path,
    gateway: &PersistenceGateway<F>,
) -> DocumentOutcome {
    let source = source_id(path);
    let span = info_span!("document", source = %source);
    let _guard = span.enter();

    let document = match read_document(path) {
        Ok(document) => document,
        Err(error) => {
            warn!(%error, "document not decoded");
            return DocumentOutcome::failed(source, DocumentStage::Read, error.to_string());
        }
    };

    let extracted = match extract_document(&document, &source) {
        Ok(extracted) => extracted,
        Err(IngestError::NotAPatientBundle { reason, .. }) => {
            warn!(%reason, "not a patient bundle, skipped");
            return DocumentOutcome::skipped(
                source,
                DocumentStage::Decoded,
                SkipReason::NotAPatientBundle,
            );
        }
        Err(error) => {
            warn!(%error, "extraction failed");
            return DocumentOutcome::failed(source, DocumentStage::Validated, error.to_string());
        }
    };
    for element in &extracted.skipped {
        debug!(
            collection = element.collection.as_str(),
            index = element.index,
            reason = %element.reason,
            "element skipped"
        );
    }

    persist(source, &extracted, gateway)
}

fn persist<F: ConnectionFactory>(
    source: String,
    extracted: &ExtractedDocument,
    gateway: &PersistenceGateway<F>,
) -> DocumentOutcome {
    let patient = &extracted.patient;
    let unique_id = redact_value(patient.unique_id.as_str());

    match gateway.find_patient(&patient.unique_id) {
        Ok(Some(_)) => {
            info!(unique_id, "patient already ingested, skipped");
            return DocumentOutcome::skipped(source, DocumentStage::Extracted, SkipReason::Duplicate);
        }
        Ok(None) => {}
        Err(error) => {
            warn!(%error, "patient lookup failed");
            return DocumentOutcome::failed(source, DocumentStage::Extracted, error.to_string());
        }
    }

    let patient_id = match gateway.insert_patient(patient) {
        Ok(PatientInsert::Inserted(id)) => id,
        Ok(PatientInsert::Duplicate) => {
            info!(unique_id, "patient stored concurrently, skipped");
            return DocumentOutcome::skipped(source, DocumentStage::Extracted, SkipReason::Duplicate);
        }
        Err(error) => {
            warn!(%error, "patient not stored");
            return DocumentOutcome::failed(source, DocumentStage::Extracted, error.to_string());
        }
    };

    let reports = [
        gateway.insert_contacts(patient_id, &extracted.contacts),
        gateway.insert_identifiers(patient_id, &extracted.identifiers),
        gateway.insert_languages(patient_id, &extracted.languages),
        gateway.insert_events(patient_id, &extracted.events),
    ];
    let mut outcome = DocumentOutcome::persisted(source);
    outcome.skipped_elements = extracted.skipped.len();
    for report in &reports {
        outcome.child_failures.extend(report.failure_messages());
    }
    if !outcome.child_failures.is_empty() {
        warn!(
            patient_id = %patient_id,
            failures = outcome.child_failures.len(),
            "patient stored with missing child rows"
        );
    }
    debug!(
        patient_id = %patient_id,
        unique_id,
        events = extracted.events.len(),
        "document persisted"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirflat_model::DocumentStatus;

    #[test]
    fn settled_outcomes_survive_a_worker_panic() {
        let paths: Vec<PathBuf> = ["a.json", "b.json", "c.json", "d.json", "e.json"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let outcomes = settle_on_workers(&paths, 2, |path| {
            assert_ne!(path, Path::new("c.json"), "unreadable document");
            DocumentOutcome::persisted(source_id(path))
        });

        let sources: Vec<&str> = outcomes.iter().map(|o| o.source_id.as_str()).collect();
        assert_eq!(sources, ["a.json", "b.json", "c.json", "d.json", "e.json"]);
        for (index, outcome) in outcomes.iter().enumerate() {
            if index == 2 {
                assert_eq!(
                    outcome.status,
                    DocumentStatus::Failed {
                        message: "worker panicked".to_string()
                    }
                );
            } else {
                assert!(outcome.is_persisted(), "{} lost", outcome.source_id);
            }
        }
    }
}
