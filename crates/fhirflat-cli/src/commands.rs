use anyhow::{Context, Result};
use tracing::{info, info_span};

use fhirflat_cli::pipeline::{BatchResult, IngestOptions, ingest_directory};
use fhirflat_export::export_patients;
use fhirflat_model::ExportSummary;
use fhirflat_store::{PersistenceGateway, SqliteConnector, create_database};

use crate::cli::{ExportArgs, IngestArgs, JobsArgs, RunArgs, StoreArgs};

pub struct RunResult {
    pub batch: BatchResult,
    pub export: ExportSummary,
}

fn open_store(args: &StoreArgs, create: bool) -> Result<PersistenceGateway<SqliteConnector>> {
    let connector = if create {
        create_database(&args.database)
            .with_context(|| format!("create store {}", args.database))?
    } else {
        SqliteConnector::from_address(&args.database)
            .with_context(|| format!("open store {}", args.database))?
    };
    Ok(PersistenceGateway::new(connector))
}

fn ingest_options(args: &JobsArgs) -> IngestOptions {
    IngestOptions {
        jobs: usize::from(args.jobs),
    }
}

pub fn run_ingest(args: &IngestArgs) -> Result<BatchResult> {
    let gateway = open_store(&args.store, args.create)?;
    ingest_directory(&args.input_dir, &gateway, ingest_options(&args.jobs))
}

pub fn run_export(args: &ExportArgs) -> Result<ExportSummary> {
    let gateway = open_store(&args.store, false)?;
    let span = info_span!("export", output = %args.output_dir.display());
    let _guard = span.enter();
    export_patients(&gateway, &args.output_dir)
        .with_context(|| format!("export to {}", args.output_dir.display()))
}

pub fn run_all(args: &RunArgs) -> Result<RunResult> {
    let gateway = open_store(&args.store, true)?;
    let batch = ingest_directory(&args.input_dir, &gateway, ingest_options(&args.jobs))?;
    info!(persisted = batch.summary.persisted, "ingest finished, exporting");
    let span = info_span!("export", output = %args.output_dir.display());
    let _guard = span.enter();
    let export = export_patients(&gateway, &args.output_dir)
        .with_context(|| format!("export to {}", args.output_dir.display()))?;
    Ok(RunResult { batch, export })
}
