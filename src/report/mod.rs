//! The reporting engine.
//!
//! A [`SuiteRun`] owns one run's context stack and counters. Every call reports
//! immediately: it updates the counters and hands one or two events to the
//! presenter before returning.
//!
//! The run's lifecycle is carried by ownership. No run exists before
//! [`SuiteRun::start`]; [`SuiteRun::finish`] consumes it, so nothing can be reported
//! after the summary has been produced.
//!
//! ```
//! use nestspec::output::TextPresenter;
//! use nestspec::report::SuiteRun;
//! use termcolor::NoColor;
//!
//! let mut run = SuiteRun::start("math", TextPresenter::new(NoColor::new(Vec::new())));
//! run.describe(format_args!("addition"), |run| {
//!     run.assert_zero("2+2-4", &(2 + 2 - 4), format_args!("two plus two is four"));
//! });
//! let summary = run.finish();
//! assert_eq!(summary.exit_status(), 0);
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

mod assertion;
mod context;
mod counters;

pub use assertion::{Comparison, IsZero};
pub use context::{Context, ContextStack};
pub use counters::{Counters, Outcome, Summary};

use crate::config::ReportConfig;
use crate::output::{Event, Presenter, Severity};
use crate::render::{render_bounded, COMMENT_SIZE};

/// A running suite.
pub struct SuiteRun<P: Presenter> {
    name: String,
    presenter: P,
    contexts: ContextStack,
    counters: Counters,
    comment_limit: usize,
}

impl<P: Presenter> SuiteRun<P> {
    /// Starts a run with the default message buffer size and emits the start banner.
    pub fn start(name: impl Into<String>, presenter: P) -> Self {
        Self::with_comment_limit(name, presenter, COMMENT_SIZE)
    }

    pub fn with_comment_limit(name: impl Into<String>, presenter: P, comment_limit: usize) -> Self {
        let mut run = Self {
            name: name.into(),
            presenter,
            contexts: ContextStack::new(),
            counters: Counters::new(),
            comment_limit,
        };
        tracing::debug!(suite = %run.name, "suite started");
        run.presenter.present(&Event::Start { suite: &run.name });
        run
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> usize {
        self.contexts.depth()
    }

    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Counts so far, without finishing.
    pub fn summary(&self) -> Summary {
        self.counters.snapshot()
    }

    /// Emits a context line at the current depth, then nests one level deeper.
    pub fn enter_context(&mut self, description: fmt::Arguments<'_>) {
        let rendered = render_bounded(description, self.comment_limit);
        self.emit(Severity::Context, &rendered.text);
        self.contexts.push(rendered.text);
    }

    /// Leaves the innermost context. Emits nothing; a no-op when not nested.
    pub fn exit_context(&mut self) {
        self.contexts.pop();
    }

    /// Enters a context that is left when the returned guard is dropped.
    pub fn context(&mut self, description: fmt::Arguments<'_>) -> ContextGuard<'_, P> {
        let depth = self.depth();
        self.enter_context(description);
        ContextGuard { run: self, depth }
    }

    /// Runs `body` inside a context, leaving it however `body` exits.
    pub fn describe<R>(
        &mut self,
        description: fmt::Arguments<'_>,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let mut guard = self.context(description);
        body(&mut *guard)
    }

    /// Records an already-evaluated assertion. A failure is followed by a `code:`
    /// line naming `expression` and the comparison.
    pub fn report_assertion(
        &mut self,
        expression: &str,
        comparison: Comparison,
        passed: bool,
        comment: fmt::Arguments<'_>,
    ) -> bool {
        let rendered = render_bounded(comment, self.comment_limit);
        if passed {
            self.counters.record(Outcome::Success);
            self.emit(Severity::Success, &rendered.text);
        } else {
            self.counters.record(Outcome::Failure);
            self.emit(Severity::Failure, &rendered.text);
            self.presenter.present(&Event::Code {
                scope: &self.contexts,
                expression,
                comparison,
            });
        }
        passed
    }

    /// Passes when `value` is zero.
    pub fn assert_zero<V: IsZero + ?Sized>(
        &mut self,
        expression: &str,
        value: &V,
        comment: fmt::Arguments<'_>,
    ) -> bool {
        let comparison = Comparison::EqualsZero;
        let passed = comparison.evaluate(value);
        self.report_assertion(expression, comparison, passed, comment)
    }

    /// Passes when `value` is not zero.
    pub fn assert_nonzero<V: IsZero + ?Sized>(
        &mut self,
        expression: &str,
        value: &V,
        comment: fmt::Arguments<'_>,
    ) -> bool {
        let comparison = Comparison::NotEqualsZero;
        let passed = comparison.evaluate(value);
        self.report_assertion(expression, comparison, passed, comment)
    }

    /// Passes when `condition` holds.
    pub fn assert_that(
        &mut self,
        expression: &str,
        condition: bool,
        comment: fmt::Arguments<'_>,
    ) -> bool {
        self.report_assertion(expression, Comparison::IsTrue, condition, comment)
    }

    /// Marks a check as not yet implemented.
    pub fn pending(&mut self, comment: fmt::Arguments<'_>) {
        let rendered = render_bounded(comment, self.comment_limit);
        self.counters.record(Outcome::Pending);
        self.emit(Severity::Pending, &rendered.text);
    }

    /// Emits the summary lines and ends the run.
    pub fn finish(mut self) -> Summary {
        let summary = self.counters.snapshot();
        if !self.contexts.is_empty() {
            tracing::warn!(
                suite = %self.name,
                depth = self.contexts.depth(),
                "suite finished with open contexts"
            );
        }
        self.presenter.present(&Event::Summary(&summary));
        tracing::debug!(
            suite = %self.name,
            succeeded = summary.succeeded,
            failed = summary.failed,
            pending = summary.pending,
            "suite finished"
        );
        summary
    }

    fn emit(&mut self, severity: Severity, message: &str) {
        tracing::trace!(depth = self.contexts.depth(), severity = severity.label(), "{}", message);
        self.presenter.present(&Event::Report {
            scope: &self.contexts,
            severity,
            message,
        });
    }
}

/// Keeps a context open for as long as it lives. Dereferences to the run so
/// reporting continues one level deeper.
///
/// Dropping the guard restores the depth the run had before the context was
/// entered, whatever the body did to the stack in between. Contexts opened
/// outside the guard are never closed by it.
pub struct ContextGuard<'r, P: Presenter> {
    run: &'r mut SuiteRun<P>,
    depth: usize,
}

impl<P: Presenter> Deref for ContextGuard<'_, P> {
    type Target = SuiteRun<P>;

    fn deref(&self) -> &SuiteRun<P> {
        self.run
    }
}

impl<P: Presenter> DerefMut for ContextGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut SuiteRun<P> {
        self.run
    }
}

impl<P: Presenter> Drop for ContextGuard<'_, P> {
    fn drop(&mut self) {
        self.run.contexts.truncate(self.depth);
    }
}

/// Runs a whole suite against stdout as configured and returns its summary.
///
/// Meant for a program whose `main` is a suite:
///
/// ```no_run
/// use nestspec::{assert_zero, run_suite, ReportConfig};
///
/// let summary = run_suite("math", &ReportConfig::default(), |run| {
///     assert_zero!(run, 2 + 2 - 4, "two plus two is four");
/// });
/// std::process::exit(summary.process_status());
/// ```
pub fn run_suite<F>(name: &str, config: &ReportConfig, body: F) -> Summary
where
    F: FnOnce(&mut SuiteRun<Box<dyn Presenter>>),
{
    let mut run =
        SuiteRun::with_comment_limit(name, config.stdout_presenter(), config.comment_limit);
    body(&mut run);
    run.finish()
}
