//! Export driver.

use std::fs;
use std::path::Path;

use fhirflat_model::{ExportFailure, ExportSummary};
use fhirflat_store::{ConnectionFactory, PersistenceGateway, StoredEvent, StoredPatient};

use crate::error::{ExportError, Result};
use crate::layout::{event_file_name, patient_dir_name};
use crate::payload::flatten_stored_payload;
use crate::writer::{write_event_csv, write_summary_csv};

/// Writes one directory per stored patient under `output_dir`.
///
/// Fails only when the store cannot be listed or `output_dir` cannot be
/// created; patient and event failures are collected in the summary.
pub fn export_patients<F: ConnectionFactory>(
    gateway: &PersistenceGateway<F>,
    output_dir: &Path,
) -> Result<ExportSummary> {
    fs::create_dir_all(output_dir).map_err(|source| ExportError::Io {
        operation: "create",
        path: output_dir.to_path_buf(),
        source,
    })?;
    let patients = gateway.list_patients()?;
    tracing::info!(patients = patients.len(), "exporting stored patients");

    let mut summary = ExportSummary {
        output_dir: output_dir.to_path_buf(),
        ..ExportSummary::default()
    };
    for patient in &patients {
        let _span = tracing::info_span!("patient", patient_id = %patient.id).entered();
        match export_patient(gateway, output_dir, patient, &mut summary) {
            Ok(()) => summary.patients += 1,
            Err(err) => {
                tracing::warn!(error = %err, "patient not exported");
                summary.failures.push(ExportFailure {
                    subject: format!("patient {}", patient.id),
                    message: err.to_string(),
                });
            }
        }
    }
    tracing::info!(
        patients = summary.patients,
        event_files = summary.event_files,
        failures = summary.failures.len(),
        "export finished"
    );
    Ok(summary)
}

fn export_patient<F: ConnectionFactory>(
    gateway: &PersistenceGateway<F>,
    output_dir: &Path,
    patient: &StoredPatient,
    summary: &mut ExportSummary,
) -> Result<()> {
    let dir = output_dir.join(patient_dir_name(
        &patient.family_name,
        &patient.birth_date,
        &patient.given_name,
    ));
    fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
        operation: "create",
        path: dir.clone(),
        source,
    })?;
    write_summary_csv(&dir, patient)?;
    summary.summary_files += 1;

    let events = gateway.list_events(patient.id)?;
    tracing::debug!(events = events.len(), "writing event files");
    for event in &events {
        match export_event(&dir, event) {
            Ok(()) => summary.event_files += 1,
            Err(err) => {
                tracing::warn!(event_id = %event.event_id, error = %err, "event not exported");
                summary.failures.push(ExportFailure {
                    subject: format!("event {}", event.event_id),
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn export_event(dir: &Path, event: &StoredEvent) -> Result<()> {
    let table = flatten_stored_payload(&event.payload)?;
    write_event_csv(dir, &event_file_name(event), &table)?;
    Ok(())
}
