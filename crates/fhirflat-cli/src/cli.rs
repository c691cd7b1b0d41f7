//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fhirflat",
    version,
    about = "Load patient bundles into a relational store and export them as CSV",
    long_about = "Load a directory of patient bundle documents into a relational store.\n\n\
                  Each bundle yields one patient row plus contact, identifier, language\n\
                  and event rows. Stored patients can be exported to one directory per\n\
                  patient with a summary CSV and one CSV per event."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include patient identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load every .json bundle in a directory into the store.
    Ingest(IngestArgs),

    /// Export stored patients and events as CSV files.
    Export(ExportArgs),

    /// Create the store if needed, ingest a directory, then export.
    Run(RunArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    /// Store address: sqlite://<path>, sqlite:<path> or a plain file path.
    #[arg(long = "database", value_name = "ADDR", env = "FHIRFLAT_DATABASE")]
    pub database: String,
}

#[derive(Args)]
pub struct JobsArgs {
    /// Number of documents processed concurrently.
    #[arg(
        long = "jobs",
        short = 'j',
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub jobs: u16,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Directory containing bundle documents.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Create the store and its tables when missing.
    #[arg(long = "create")]
    pub create: bool,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Directory receiving one sub-directory per patient.
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_jobs() {
        let cli = Cli::parse_from([
            "fhirflat",
            "run",
            "in",
            "out",
            "--database",
            "sqlite://flat.db",
            "-j",
            "4",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.jobs.jobs, 4);
        assert_eq!(args.store.database, "sqlite://flat.db");
        assert_eq!(args.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn rejects_zero_jobs() {
        let result = Cli::try_parse_from([
            "fhirflat",
            "ingest",
            "in",
            "--database",
            "flat.db",
            "--jobs",
            "0",
        ]);
        assert!(result.is_err());
    }
}
