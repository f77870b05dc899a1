// End-to-end checks of the reporting engine through its public API.

use nestspec::output::{JsonPresenter, TextPresenter};
use nestspec::{assert_nonzero, assert_zero, check, context, pending, Summary, SuiteRun};
use termcolor::NoColor;

fn captured() -> TextPresenter<NoColor<Vec<u8>>> {
    TextPresenter::new(NoColor::new(Vec::new()))
}

fn text(presenter: TextPresenter<NoColor<Vec<u8>>>) -> String {
    String::from_utf8(presenter.into_inner().into_inner()).unwrap()
}

#[test]
fn math_suite_matches_reference_trace() {
    let mut out = captured();
    let mut run = SuiteRun::start("math", &mut out);
    run.enter_context(format_args!("addition"));
    run.assert_zero("2+2-4", &(2 + 2 - 4), format_args!("two plus two is four"));
    run.assert_zero("2+2-5", &(2 + 2 - 5), format_args!("two plus two is five"));
    run.exit_context();
    run.pending(format_args!("division by zero"));
    let summary = run.finish();

    assert_eq!(summary.exit_status(), 1);
    assert_eq!(
        text(out),
        concat!(
            "start: math\n",
            "context: addition\n",
            "    success: two plus two is four\n",
            "    failure: two plus two is five\n",
            "         code: (2+2-5) == 0\n",
            "pending: division by zero\n",
            "Succeed: 1\n",
            "Failed: 1\n",
            "Pending: 1\n",
        )
    );
}

#[test]
fn exit_status_is_failure_count() {
    let mut out = captured();
    let mut run = SuiteRun::start("failures", &mut out);
    for i in 0..5 {
        assert_zero!(run, i % 2, "{} is even", i);
    }
    let summary = run.finish();
    assert_eq!(
        summary,
        Summary {
            succeeded: 3,
            failed: 2,
            pending: 0
        }
    );
    assert_eq!(summary.exit_status(), 2);
    assert_eq!(summary.process_status(), 2);
}

#[test]
fn depth_never_goes_negative() {
    let mut out = captured();
    let mut run = SuiteRun::start("depth", &mut out);
    let ops = [true, false, false, true, true, false, false, false, true];
    let mut expected = 0usize;
    for enter in ops {
        if enter {
            run.enter_context(format_args!("level {}", expected));
            expected += 1;
        } else {
            run.exit_context();
            expected = expected.saturating_sub(1);
        }
        assert_eq!(run.depth(), expected);
    }
}

#[test]
fn indentation_tracks_nesting() {
    let mut out = captured();
    let mut run = SuiteRun::start("indent", &mut out);
    {
        let mut a = context!(run, "A");
        {
            let mut b = context!(a, "B");
            assert_nonzero!(b, 1, "deep");
        }
        assert_nonzero!(a, 1, "shallow");
    }
    check!(run, true, "top");
    pending!(run, "later");
    run.finish();

    let out = text(out);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "context: A");
    assert_eq!(lines[2], "    context: B");
    assert_eq!(lines[3], "        success: deep");
    assert_eq!(lines[4], "    success: shallow");
    assert_eq!(lines[5], "success: top");
    assert_eq!(lines[6], "pending: later");
}

#[test]
fn guard_unbalanced_early_return_still_pops() {
    fn body(run: &mut SuiteRun<&mut TextPresenter<NoColor<Vec<u8>>>>) -> Option<()> {
        let mut ctx = context!(run, "may bail");
        assert_zero!(ctx, 0, "first");
        let bail: Option<()> = None;
        bail?;
        assert_zero!(ctx, 0, "never reached");
        Some(())
    }

    let mut out = captured();
    let mut run = SuiteRun::start("bail", &mut out);
    assert!(body(&mut run).is_none());
    assert_eq!(run.depth(), 0);
    assert_eq!(run.finish().succeeded, 1);
}

#[test]
fn independent_runs_aggregate_after_finish() {
    let mut first_out = captured();
    let mut second_out = captured();
    let mut first = SuiteRun::start("first", &mut first_out);
    let mut second = SuiteRun::start("second", &mut second_out);

    assert_zero!(first, 1, "fails");
    first.enter_context(format_args!("only in first"));
    assert_zero!(second, 0, "passes");
    assert_eq!(second.depth(), 0);

    let total: Summary = [first.finish(), second.finish()].into_iter().sum();
    assert_eq!((total.succeeded, total.failed), (1, 1));
    assert!(text(second_out).ends_with("success: passes\nSucceed: 1\n"));
}

#[test]
fn json_stream_has_one_record_per_event() {
    let mut presenter = JsonPresenter::new(Vec::new());
    let mut run = SuiteRun::start("json", &mut presenter);
    run.describe(format_args!("ctx"), |run| {
        assert_zero!(run, 1, "fails");
    });
    run.finish();

    let out = String::from_utf8(presenter.into_inner()).unwrap();
    let records: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = records.iter().map(|r| r["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["start", "report", "report", "code", "summary"]);
    assert_eq!(records[1]["severity"], "context");
    assert_eq!(records[1]["depth"], 0);
    assert_eq!(records[2]["severity"], "failure");
    assert_eq!(records[2]["context"], serde_json::json!(["ctx"]));
    assert_eq!(records[3]["expression"], "1");
    assert_eq!(records[3]["comparison"], "== 0");
    assert_eq!(records[4]["status"], 1);
}
