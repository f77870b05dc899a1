//! Defines the command-line arguments and subcommands for the nestspec CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ColorMode, OutputFormat, ReportConfig};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "nestspec",
    version,
    about = "Run declarative test suites and print a nested, colorized report."
)]
pub struct NestspecArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run suite files; the exit status is the number of failed assertions.
    #[command(after_help = "Exit status: the number of failed assertions, capped at 255. \
        Status 2 also means a suite file, the config or the arguments could not be loaded; \
        in that case no suite runs, stdout is empty and the error is on stderr.")]
    Run {
        /// Suite files, or directories to search for `.yaml` / `.yml` files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Load and validate suite files without running them.
    Check {
        /// Suite files, or directories to search for `.yaml` / `.yml` files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Report settings. Flags override values read from `--config`.
#[derive(Debug, Default, Args)]
pub struct ReportArgs {
    /// YAML file holding report settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// When to color the report.
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,
    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// Spaces per nesting level (0-255).
    #[arg(long, value_parser = clap::value_parser!(u8))]
    pub indent: Option<u8>,
    /// Buffer size for rendered messages; longer messages are truncated.
    #[arg(long)]
    pub comment_limit: Option<usize>,
}

impl ReportArgs {
    /// Lays the flags that were given over `base`.
    pub fn apply(&self, mut base: ReportConfig) -> ReportConfig {
        if let Some(color) = self.color {
            base.color = color;
        }
        if let Some(format) = self.format {
            base.format = format;
        }
        if let Some(indent) = self.indent {
            base.indent = indent;
        }
        if let Some(limit) = self.comment_limit {
            base.comment_limit = limit;
        }
        base
    }
}
