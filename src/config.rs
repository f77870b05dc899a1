//! Runtime configuration for reporting.

use std::env;
use std::io;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::output::{JsonPresenter, Presenter, TextPresenter};
use crate::render::{COMMENT_SIZE, INDENT_SIZE};

/// When to color text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn color_choice(&self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto => {
                let no_color = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
                if no_color || !atty::is(atty::Stream::Stdout) {
                    ColorChoice::Never
                } else {
                    ColorChoice::Auto
                }
            }
        }
    }
}

/// Shape of the report stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented, optionally colored lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// How a suite run is presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub color: ColorMode,
    pub format: OutputFormat,
    /// Spaces per nesting level, at most 255.
    pub indent: u8,
    /// Buffer size for rendered messages, terminator slot included.
    pub comment_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            format: OutputFormat::Text,
            indent: INDENT_SIZE,
            comment_limit: COMMENT_SIZE,
        }
    }
}

impl ReportConfig {
    /// Builds the configured presenter over `out`. JSON ignores color settings.
    pub fn presenter<W>(&self, out: W) -> Box<dyn Presenter>
    where
        W: WriteColor + 'static,
    {
        match self.format {
            OutputFormat::Text => Box::new(TextPresenter::with_indent(out, self.indent)),
            OutputFormat::Json => Box::new(JsonPresenter::new(out)),
        }
    }

    pub fn stdout_presenter(&self) -> Box<dyn Presenter> {
        match self.format {
            OutputFormat::Text => self.presenter(StandardStream::stdout(self.color.color_choice())),
            OutputFormat::Json => Box::new(JsonPresenter::new(io::stdout())),
        }
    }
}
