//! Presentation of report events.
//!
//! The engine emits [`Event`]s tagged with a [`Severity`]; a [`Presenter`] decides how
//! they look. [`TextPresenter`] produces the indented, colorized trace and
//! [`JsonPresenter`] produces one JSON object per line.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::render::INDENT_SIZE;
use crate::report::{Comparison, ContextStack, Summary};

// ============================================================================
// EVENTS
// ============================================================================

/// Severity class of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Context,
    Success,
    Failure,
    Pending,
}

impl Severity {
    /// Prefix written before the message.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Context => "context",
            Severity::Success => "success",
            Severity::Failure => "failure",
            Severity::Pending => "pending",
        }
    }

    /// Foreground color used by the text presenter.
    pub fn color(&self) -> Color {
        match self {
            Severity::Context => Color::Blue,
            Severity::Success => Color::Green,
            Severity::Failure => Color::Red,
            Severity::Pending => Color::Yellow,
        }
    }
}

/// One thing the engine wants shown.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A suite run began.
    Start { suite: &'a str },
    /// A context entry, assertion outcome, or pending marker. `scope` is the stack
    /// at emission time and decides indentation.
    Report {
        scope: &'a ContextStack,
        severity: Severity,
        message: &'a str,
    },
    /// The diagnostic line following a failure.
    Code {
        scope: &'a ContextStack,
        expression: &'a str,
        comparison: Comparison,
    },
    /// Final counts of a finished run.
    Summary(&'a Summary),
}

/// Consumer of report events. Presenting never fails from the engine's point of
/// view; implementations deal with their own I/O errors.
pub trait Presenter {
    fn present(&mut self, event: &Event<'_>);
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(&mut self, event: &Event<'_>) {
        (**self).present(event)
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn present(&mut self, event: &Event<'_>) {
        (**self).present(event)
    }
}

// ============================================================================
// TEXT PRESENTER
// ============================================================================

/// Writes the human-readable trace:
///
/// ```text
/// start: math
/// context: addition
///     success: two plus two is four
///     failure: two plus two is five
///          code: (2+2-5) == 0
/// pending: division by zero
/// Succeed: 1
/// Failed: 1
/// Pending: 1
/// ```
pub struct TextPresenter<W: WriteColor> {
    out: W,
    indent: u8,
}

impl<W: WriteColor> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self::with_indent(out, INDENT_SIZE)
    }

    /// Uses `indent` spaces per nesting level.
    pub fn with_indent(out: W, indent: u8) -> Self {
        Self { out, indent }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event<'_>) -> io::Result<()> {
        match *event {
            Event::Start { suite } => writeln!(self.out, "start: {}", suite)?,
            Event::Report {
                scope,
                severity,
                message,
            } => {
                self.write_indent(scope.depth())?;
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(severity.color())))?;
                write!(self.out, "{}: {}", severity.label(), message)?;
                self.out.reset()?;
                writeln!(self.out)?;
            }
            Event::Code {
                scope,
                expression,
                comparison,
            } => {
                self.write_indent(scope.depth())?;
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(Severity::Failure.color())))?;
                write!(
                    self.out,
                    "     code: ({}) {}",
                    expression,
                    comparison.symbol()
                )?;
                self.out.reset()?;
                writeln!(self.out)?;
            }
            Event::Summary(summary) => {
                for (label, count) in summary.lines() {
                    writeln!(self.out, "{}: {}", label, count)?;
                }
            }
        }
        self.out.flush()
    }

    fn write_indent(&mut self, depth: usize) -> io::Result<()> {
        let width = depth.saturating_mul(usize::from(self.indent));
        write!(self.out, "{:width$}", "", width = width)
    }
}

impl<W: WriteColor> Presenter for TextPresenter<W> {
    fn present(&mut self, event: &Event<'_>) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}

// ============================================================================
// JSON PRESENTER
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Start {
        suite: &'a str,
    },
    Report {
        severity: Severity,
        depth: usize,
        context: Vec<&'a str>,
        message: &'a str,
    },
    Code {
        depth: usize,
        context: Vec<&'a str>,
        expression: &'a str,
        comparison: &'static str,
    },
    Summary {
        succeeded: u64,
        failed: u64,
        pending: u64,
        status: u64,
    },
}

impl<'a> From<&Event<'a>> for Record<'a> {
    fn from(event: &Event<'a>) -> Self {
        match *event {
            Event::Start { suite } => Record::Start { suite },
            Event::Report {
                scope,
                severity,
                message,
            } => Record::Report {
                severity,
                depth: scope.depth(),
                context: scope.path(),
                message,
            },
            Event::Code {
                scope,
                expression,
                comparison,
            } => Record::Code {
                depth: scope.depth(),
                context: scope.path(),
                expression,
                comparison: comparison.symbol(),
            },
            Event::Summary(summary) => Record::Summary {
                succeeded: summary.succeeded,
                failed: summary.failed,
                pending: summary.pending,
                status: summary.exit_status(),
            },
        }
    }
}

/// Writes each event as a single-line JSON object.
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &Record::from(event))?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, event: &Event<'_>) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!(error = %e, "failed to write json event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::{Buffer, NoColor};

    fn stack(descriptions: &[&str]) -> ContextStack {
        let mut stack = ContextStack::new();
        for d in descriptions {
            stack.push(d.to_string());
        }
        stack
    }

    fn text(events: &[Event<'_>]) -> String {
        let mut presenter = TextPresenter::new(NoColor::new(Vec::new()));
        for event in events {
            presenter.present(event);
        }
        String::from_utf8(presenter.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn test_report_line_is_indented_by_depth() {
        let scope = stack(&["a", "b"]);
        let out = text(&[Event::Report {
            scope: &scope,
            severity: Severity::Success,
            message: "fine",
        }]);
        assert_eq!(out, "        success: fine\n");
    }

    #[test]
    fn test_code_line_follows_failure_indent() {
        let scope = stack(&["a"]);
        let out = text(&[
            Event::Report {
                scope: &scope,
                severity: Severity::Failure,
                message: "broken",
            },
            Event::Code {
                scope: &scope,
                expression: "x - y",
                comparison: Comparison::EqualsZero,
            },
        ]);
        assert_eq!(out, "    failure: broken\n         code: (x - y) == 0\n");
    }

    #[test]
    fn test_summary_omits_zero_counts() {
        let summary = Summary {
            succeeded: 3,
            failed: 0,
            pending: 2,
        };
        let out = text(&[Event::Start { suite: "s" }, Event::Summary(&summary)]);
        assert_eq!(out, "start: s\nSucceed: 3\nPending: 2\n");
    }

    #[test]
    fn test_custom_indent_unit() {
        let scope = stack(&["a"]);
        let mut presenter = TextPresenter::with_indent(NoColor::new(Vec::new()), 2);
        presenter.present(&Event::Report {
            scope: &scope,
            severity: Severity::Pending,
            message: "later",
        });
        let out = String::from_utf8(presenter.into_inner().into_inner()).unwrap();
        assert_eq!(out, "  pending: later\n");
    }

    #[test]
    fn test_widest_indent_unit() {
        let scope = stack(&["a", "b"]);
        let mut presenter = TextPresenter::with_indent(NoColor::new(Vec::new()), u8::MAX);
        presenter.present(&Event::Report {
            scope: &scope,
            severity: Severity::Pending,
            message: "far",
        });
        let out = String::from_utf8(presenter.into_inner().into_inner()).unwrap();
        assert_eq!(out, format!("{}pending: far\n", " ".repeat(510)));
    }

    #[test]
    fn test_colored_output_wraps_message_only() {
        let scope = stack(&["a"]);
        let mut presenter = TextPresenter::new(Buffer::ansi());
        presenter.present(&Event::Report {
            scope: &scope,
            severity: Severity::Failure,
            message: "red",
        });
        let out = String::from_utf8(presenter.into_inner().into_inner()).unwrap();
        assert!(out.starts_with("    \x1b["));
        assert!(out.contains("failure: red"));
        assert!(out.ends_with("\x1b[0m\n"));
    }

    #[test]
    fn test_json_records() {
        let scope = stack(&["math", "addition"]);
        let mut presenter = JsonPresenter::new(Vec::new());
        presenter.present(&Event::Report {
            scope: &scope,
            severity: Severity::Failure,
            message: "oops",
        });
        presenter.present(&Event::Summary(&Summary {
            succeeded: 1,
            failed: 2,
            pending: 0,
        }));
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["event"], "report");
        assert_eq!(lines[0]["severity"], "failure");
        assert_eq!(lines[0]["depth"], 2);
        assert_eq!(lines[0]["context"], serde_json::json!(["math", "addition"]));
        assert_eq!(lines[1]["event"], "summary");
        assert_eq!(lines[1]["status"], 2);
    }
}
