//! The nestspec Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::Diagnostic;
use thiserror::Error;

use crate::cli::args::{Command, NestspecArgs, ReportArgs};
use crate::config::ReportConfig;
use crate::report::Summary;
use crate::script::{self, CompiledSuite};

pub mod args;
pub mod logging;

/// Exit status when suites could not be loaded; nothing has run in that case.
///
/// Shares its value with a run of exactly two failures and with clap's usage
/// errors. A load failure is the case where stdout is empty.
pub const LOAD_FAILURE: i32 = 2;

/// Problems with the command line itself, as opposed to a suite file.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("failed to read config {}", path.display())]
    #[diagnostic(code(nestspec::config))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    #[diagnostic(
        code(nestspec::config),
        help("known keys are `color`, `format`, `indent` and `comment_limit`")
    )]
    ConfigYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no suite files found under {}", paths.join(", "))]
    #[diagnostic(code(nestspec::discovery))]
    NoSuites { paths: Vec<String> },
}

/// The main entry point for the CLI. Returns the process exit status.
pub fn run() -> i32 {
    let args = NestspecArgs::parse();
    logging::init_tracing();

    match args.command {
        Command::Run { paths, report } => handle_run(&paths, &report),
        Command::Check { paths } => handle_check(&paths),
    }
}

/// Handles the `run` subcommand.
fn handle_run(paths: &[PathBuf], report: &ReportArgs) -> i32 {
    let config = match resolve_config(report) {
        Ok(config) => config,
        Err(e) => {
            print_diagnostic(e);
            return LOAD_FAILURE;
        }
    };
    let Some(suites) = load_suites(paths) else {
        return LOAD_FAILURE;
    };

    let total: Summary = suites
        .iter()
        .map(|suite| suite.execute(config.stdout_presenter(), &config))
        .sum();
    tracing::info!(
        suites = suites.len(),
        succeeded = total.succeeded,
        failed = total.failed,
        pending = total.pending,
        "all suites finished"
    );
    total.process_status()
}

/// Handles the `check` subcommand.
fn handle_check(paths: &[PathBuf]) -> i32 {
    let Some(suites) = load_suites(paths) else {
        return LOAD_FAILURE;
    };
    for suite in &suites {
        let shape = suite.shape();
        println!(
            "ok: {} ({}: {} contexts, {} assertions, {} pending)",
            suite.origin(),
            suite.name(),
            shape.contexts,
            shape.assertions,
            shape.pending
        );
    }
    0
}

fn resolve_config(report: &ReportArgs) -> Result<ReportConfig, CliError> {
    let base = match &report.config {
        Some(path) => read_config(path)?,
        None => ReportConfig::default(),
    };
    Ok(report.apply(base))
}

fn read_config(path: &Path) -> Result<ReportConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| CliError::ConfigYaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every suite under `paths`, reporting each failure. Returns `None` if any
/// file failed, so a run never starts on a partial set.
fn load_suites(paths: &[PathBuf]) -> Option<Vec<CompiledSuite>> {
    let files: Vec<PathBuf> = paths.iter().flat_map(script::discover_suite_files).collect();
    if files.is_empty() {
        print_diagnostic(CliError::NoSuites {
            paths: paths.iter().map(|p| p.display().to_string()).collect(),
        });
        return None;
    }

    let mut suites = Vec::with_capacity(files.len());
    let mut failed = false;
    for file in &files {
        match script::load(file) {
            Ok(suite) => suites.push(suite),
            Err(e) => {
                failed = true;
                print_diagnostic(e);
            }
        }
    }
    (!failed).then_some(suites)
}

fn print_diagnostic<E: Diagnostic + Send + Sync + 'static>(error: E) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
