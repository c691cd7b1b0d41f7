//! fhirflat command line entry point.

use clap::{ColorChoice, Parser};
use fhirflat_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_all, run_export, run_ingest};
use crate::summary::{print_batch_summary, print_export_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Ingest(args) => match run_ingest(args) {
            Ok(result) => {
                print_batch_summary(&result);
                i32::from(result.has_failures())
            }
            Err(error) => report(&error),
        },
        Command::Export(args) => match run_export(args) {
            Ok(summary) => {
                print_export_summary(&summary);
                i32::from(summary.has_failures())
            }
            Err(error) => report(&error),
        },
        Command::Run(args) => match run_all(args) {
            Ok(result) => {
                print_batch_summary(&result.batch);
                print_export_summary(&result.export);
                i32::from(result.batch.has_failures() || result.export.has_failures())
            }
            Err(error) => report(&error),
        },
    };
    std::process::exit(exit_code);
}

fn report(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
