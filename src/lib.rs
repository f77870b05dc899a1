//! nestspec: an in-process test reporter.
//!
//! A program opens a [`SuiteRun`], nests descriptive contexts, reports assertions
//! and pending checks, and finishes with a [`Summary`] whose failure count is the
//! process exit status. Output goes through a [`Presenter`](output::Presenter):
//! an indented, colorized text trace or JSON lines.

pub mod cli;
pub mod config;
pub mod macros;
pub mod output;
pub mod render;
pub mod report;
pub mod script;

pub use crate::config::{ColorMode, OutputFormat, ReportConfig};
pub use crate::report::{run_suite, ContextGuard, Summary, SuiteRun};
