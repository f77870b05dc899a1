//! A suite written as a program: `cargo run --example math`.

use nestspec::{assert_nonzero, assert_zero, check, context, pending, run_suite, ReportConfig};

fn divide(a: i64, b: i64) -> Option<i64> {
    a.checked_div(b)
}

fn main() {
    let summary = run_suite("math", &ReportConfig::default(), |run| {
        {
            let mut ctx = context!(run, "addition");
            assert_zero!(ctx, 2 + 2 - 4, "two plus two is four");
            assert_zero!(ctx, 2 + 2 - 5, "two plus two is {}", "five");
        }

        run.describe(format_args!("division of {} by {}", 7, 2), |run| {
            assert_nonzero!(run, divide(7, 2).unwrap_or(0), "has a quotient");
            check!(run, divide(7, 0).is_none(), "division by zero yields nothing");
        });

        pending!(run, "division by zero");
    });
    std::process::exit(summary.process_status());
}
