//! Shorthand for reporting from test code.
//!
//! The assertion macros capture the literal source text of the checked expression
//! for the failure diagnostic, and take the comment as `format!`-style arguments.
//! `$run` is anything that dereferences to a [`SuiteRun`](crate::report::SuiteRun),
//! including a context guard.

/// Enters a context and returns a guard that leaves it when dropped.
///
/// ```
/// # use nestspec::{context, report::SuiteRun, output::TextPresenter};
/// # let mut run = SuiteRun::start("s", TextPresenter::new(termcolor::NoColor::new(Vec::new())));
/// {
///     let ctx = context!(run, "when {} is empty", "input");
///     assert_eq!(ctx.depth(), 1);
/// }
/// assert_eq!(run.depth(), 0);
/// ```
#[macro_export]
macro_rules! context {
    ($run:expr, $($fmt:tt)+) => {
        $run.context(::std::format_args!($($fmt)+))
    };
}

/// Asserts that an expression evaluates to zero.
#[macro_export]
macro_rules! assert_zero {
    ($run:expr, $value:expr, $($fmt:tt)+) => {
        $run.assert_zero(
            ::std::stringify!($value),
            &($value),
            ::std::format_args!($($fmt)+),
        )
    };
}

/// Asserts that an expression does not evaluate to zero.
#[macro_export]
macro_rules! assert_nonzero {
    ($run:expr, $value:expr, $($fmt:tt)+) => {
        $run.assert_nonzero(
            ::std::stringify!($value),
            &($value),
            ::std::format_args!($($fmt)+),
        )
    };
}

/// Asserts that a boolean condition holds.
#[macro_export]
macro_rules! check {
    ($run:expr, $cond:expr, $($fmt:tt)+) => {
        $run.assert_that(
            ::std::stringify!($cond),
            $cond,
            ::std::format_args!($($fmt)+),
        )
    };
}

/// Records a pending check.
#[macro_export]
macro_rules! pending {
    ($run:expr, $($fmt:tt)+) => {
        $run.pending(::std::format_args!($($fmt)+))
    };
}
