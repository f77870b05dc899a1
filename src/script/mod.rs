//! Declarative suite files.
//!
//! A suite file is YAML describing the same tree a test program would walk:
//!
//! ```yaml
//! suite: math
//! steps:
//!   - context: addition
//!     steps:
//!       - assert_zero: 2+2-4
//!         comment: two plus two is four
//!       - assert_zero: 2+2-5
//!         comment: "two plus two is {}"
//!         args: [5]
//!   - pending: division by zero
//! ```
//!
//! Loading compiles the file: every expression is evaluated and every message
//! rendered up front, so a loaded suite always runs to completion.
//!
//! An unquoted integer expression such as `assert_zero: 0x10` is read by YAML as a
//! number and shown in decimal (`16`); quote an expression to keep its spelling.
//! Unquoted floats and booleans are rejected.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

mod error;
pub mod expr;

pub use error::ScriptError;

use crate::config::ReportConfig;
use crate::output::Presenter;
use crate::render::{Arg, Template};
use crate::report::{Comparison, Summary, SuiteRun};

// =============================================================================
// FILE MODEL
// =============================================================================

/// Top level of a suite file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    pub suite: String,
    #[serde(default, deserialize_with = "step_list")]
    pub steps: Vec<Step>,
}

/// One entry of a `steps` list. The variant is chosen by which kind key the
/// entry carries, so an error inside it names that kind.
#[derive(Debug)]
pub enum Step {
    Context(ContextStep),
    AssertZero(AssertZeroStep),
    AssertNonzero(AssertNonzeroStep),
    Check(CheckStep),
    Pending(PendingStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Context,
    AssertZero,
    AssertNonzero,
    Check,
    Pending,
}

impl StepKind {
    const ALL: [StepKind; 5] = [
        StepKind::Context,
        StepKind::AssertZero,
        StepKind::AssertNonzero,
        StepKind::Check,
        StepKind::Pending,
    ];

    fn key(self) -> &'static str {
        match self {
            StepKind::Context => "context",
            StepKind::AssertZero => "assert_zero",
            StepKind::AssertNonzero => "assert_nonzero",
            StepKind::Check => "check",
            StepKind::Pending => "pending",
        }
    }

    fn of(map: &Mapping) -> Result<Self, String> {
        let mut found = Self::ALL.into_iter().filter(|kind| map.contains_key(kind.key()));
        match (found.next(), found.next()) {
            (Some(kind), None) => Ok(kind),
            (Some(a), Some(b)) => Err(format!(
                "`{}` and `{}` cannot share one step",
                a.key(),
                b.key()
            )),
            (None, _) => Err(format!("expected one of {}", Self::keys())),
        }
    }

    fn keys() -> String {
        Self::ALL
            .iter()
            .map(|kind| format!("`{}`", kind.key()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Step {
    fn from_value(value: Value) -> Result<Self, String> {
        let kind = match &value {
            Value::Mapping(map) => StepKind::of(map)?,
            _ => return Err(format!("expected a mapping with one of {}", StepKind::keys())),
        };
        let step = match kind {
            StepKind::Context => serde_yaml::from_value(value).map(Step::Context),
            StepKind::AssertZero => serde_yaml::from_value(value).map(Step::AssertZero),
            StepKind::AssertNonzero => serde_yaml::from_value(value).map(Step::AssertNonzero),
            StepKind::Check => serde_yaml::from_value(value).map(Step::Check),
            StepKind::Pending => serde_yaml::from_value(value).map(Step::Pending),
        };
        step.map_err(|e| format!("{} step: {}", kind.key(), e))
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Step::from_value(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// Deserializes a `steps` list, prefixing any error with the failing step's number.
fn step_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Step>, D::Error> {
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            Step::from_value(value)
                .map_err(|e| D::Error::custom(format!("step {}: {}", index + 1, e)))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextStep {
    pub context: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(default, deserialize_with = "step_list")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertZeroStep {
    #[serde(deserialize_with = "expression_text")]
    pub assert_zero: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub args: Vec<Arg>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertNonzeroStep {
    #[serde(deserialize_with = "expression_text")]
    pub assert_nonzero: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub args: Vec<Arg>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckStep {
    #[serde(deserialize_with = "expression_text")]
    pub check: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub args: Vec<Arg>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PendingStep {
    pub pending: String,
    #[serde(default)]
    pub args: Vec<Arg>,
}

/// Expressions are text; YAML reads `assert_zero: 0` as a number, so integers are
/// accepted too. Anything else must be quoted.
fn expression_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::Number(n) => Err(D::Error::custom(format!(
            "expression `{n}` is not an integer; quote it to pass it as text"
        ))),
        Value::Bool(b) => Err(D::Error::custom(format!(
            "expression `{b}` is a boolean; quote it to pass it as text"
        ))),
        _ => Err(D::Error::custom("expected an expression")),
    }
}

// =============================================================================
// COMPILED SUITE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Context {
        description: String,
        steps: Vec<Node>,
    },
    Assert {
        expression: String,
        comparison: Comparison,
        value: i64,
        comment: String,
    },
    Pending {
        comment: String,
    },
}

/// A validated suite, ready to run any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSuite {
    name: String,
    origin: String,
    steps: Vec<Node>,
}

/// Static counts of what a suite contains.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuiteShape {
    pub contexts: usize,
    pub assertions: usize,
    pub pending: usize,
}

impl CompiledSuite {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the suite was loaded from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn shape(&self) -> SuiteShape {
        let mut shape = SuiteShape::default();
        count(&self.steps, &mut shape);
        shape
    }

    /// Replays the suite through an already started run.
    pub fn run<P: Presenter>(&self, run: &mut SuiteRun<P>) {
        run_nodes(&self.steps, run);
    }

    /// Starts a run on `presenter`, replays the suite and finishes the run.
    pub fn execute<P: Presenter>(&self, presenter: P, config: &ReportConfig) -> Summary {
        let mut run = SuiteRun::with_comment_limit(&self.name, presenter, config.comment_limit);
        self.run(&mut run);
        run.finish()
    }
}

fn count(nodes: &[Node], shape: &mut SuiteShape) {
    for node in nodes {
        match node {
            Node::Context { steps, .. } => {
                shape.contexts += 1;
                count(steps, shape);
            }
            Node::Assert { .. } => shape.assertions += 1,
            Node::Pending { .. } => shape.pending += 1,
        }
    }
}

fn run_nodes<P: Presenter>(nodes: &[Node], run: &mut SuiteRun<P>) {
    for node in nodes {
        match node {
            Node::Context { description, steps } => {
                run.describe(format_args!("{}", description), |run| run_nodes(steps, run));
            }
            Node::Assert {
                expression,
                comparison,
                value,
                comment,
            } => {
                let passed = comparison.evaluate(value);
                run.report_assertion(expression, *comparison, passed, format_args!("{}", comment));
            }
            Node::Pending { comment } => run.pending(format_args!("{}", comment)),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// Reads and compiles the suite file at `path`.
pub fn load(path: &Path) -> Result<CompiledSuite, ScriptError> {
    let text = fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&path.display().to_string(), &text)
}

/// Compiles suite file text. `origin` names the text in diagnostics.
pub fn parse(origin: &str, text: &str) -> Result<CompiledSuite, ScriptError> {
    let file: SuiteFile =
        serde_yaml::from_str(text).map_err(|e| ScriptError::yaml(origin, text, e))?;
    let mut compiler = Compiler {
        origin,
        path: vec![file.suite.clone()],
    };
    let steps = compiler.compile_steps(&file.steps)?;
    tracing::debug!(origin, suite = %file.suite, "suite compiled");
    Ok(CompiledSuite {
        name: file.suite,
        origin: origin.to_string(),
        steps,
    })
}

struct Compiler<'a> {
    origin: &'a str,
    path: Vec<String>,
}

impl Compiler<'_> {
    fn compile_steps(&mut self, steps: &[Step]) -> Result<Vec<Node>, ScriptError> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.compile_step(index, step))
            .collect()
    }

    fn compile_step(&mut self, index: usize, step: &Step) -> Result<Node, ScriptError> {
        let location = Location {
            origin: self.origin,
            path: &self.path,
            step: index + 1,
        }
        .to_string();

        match step {
            Step::Context(c) => {
                let description = render_message(&location, &c.context, &c.args)?;
                self.path.push(description.clone());
                let steps = self.compile_steps(&c.steps);
                self.path.pop();
                Ok(Node::Context {
                    description,
                    steps: steps?,
                })
            }
            Step::AssertZero(a) => assertion(
                location,
                &a.assert_zero,
                Comparison::EqualsZero,
                a.comment.as_deref(),
                &a.args,
            ),
            Step::AssertNonzero(a) => assertion(
                location,
                &a.assert_nonzero,
                Comparison::NotEqualsZero,
                a.comment.as_deref(),
                &a.args,
            ),
            Step::Check(a) => assertion(
                location,
                &a.check,
                Comparison::IsTrue,
                a.comment.as_deref(),
                &a.args,
            ),
            Step::Pending(p) => Ok(Node::Pending {
                comment: render_message(&location, &p.pending, &p.args)?,
            }),
        }
    }
}

fn assertion(
    location: String,
    expression: &str,
    comparison: Comparison,
    comment: Option<&str>,
    args: &[Arg],
) -> Result<Node, ScriptError> {
    let value = expr::evaluate(expression)
        .map_err(|e| ScriptError::expression(location.clone(), expression, e))?;
    let comment = match comment {
        Some(template) => render_message(&location, template, args)?,
        None => expression.to_string(),
    };
    Ok(Node::Assert {
        expression: expression.to_string(),
        comparison,
        value,
        comment,
    })
}

fn render_message(location: &str, template: &str, args: &[Arg]) -> Result<String, ScriptError> {
    Template::parse(template)
        .and_then(|t| t.render(args))
        .map_err(|source| ScriptError::Template {
            location: location.to_string(),
            source,
        })
}

/// `file.yaml: suite > context > step N`
struct Location<'a> {
    origin: &'a str,
    path: &'a [String],
    step: usize,
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.origin)?;
        for part in self.path {
            write!(f, "{} > ", part)?;
        }
        write!(f, "step {}", self.step)
    }
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// Expands `root` into suite files: a file is taken as is, a directory is searched
/// recursively for `.yaml` / `.yml` files, in sorted order.
pub fn discover_suite_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TextPresenter;
    use termcolor::NoColor;

    const MATH: &str = r#"
suite: math
steps:
  - context: addition
    steps:
      - assert_zero: 2+2-4
        comment: two plus two is four
      - assert_zero: 2+2-5
        comment: "two plus two is {}"
        args: [five]
  - pending: division by zero
"#;

    fn run_text(suite: &CompiledSuite) -> (Summary, String) {
        let mut out = TextPresenter::new(NoColor::new(Vec::new()));
        let summary = suite.execute(&mut out, &ReportConfig::default());
        let text = String::from_utf8(out.into_inner().into_inner()).unwrap();
        (summary, text)
    }

    #[test]
    fn test_math_suite_end_to_end() {
        let suite = parse("math.yaml", MATH).unwrap();
        assert_eq!(suite.name(), "math");
        let (summary, text) = run_text(&suite);
        assert_eq!(summary.exit_status(), 1);
        assert_eq!(
            text,
            "start: math\n\
             context: addition\n\
             \x20   success: two plus two is four\n\
             \x20   failure: two plus two is five\n\
             \x20        code: (2+2-5) == 0\n\
             pending: division by zero\n\
             Succeed: 1\n\
             Failed: 1\n\
             Pending: 1\n"
        );
    }

    #[test]
    fn test_shape_counts() {
        let suite = parse("math.yaml", MATH).unwrap();
        assert_eq!(
            suite.shape(),
            SuiteShape {
                contexts: 1,
                assertions: 2,
                pending: 1
            }
        );
    }

    #[test]
    fn test_numeric_expressions_and_default_comment() {
        let suite = parse(
            "n.yaml",
            "suite: n\nsteps:\n  - assert_zero: 0\n  - assert_nonzero: 3 - 3\n  - check: 2 < 3\n",
        )
        .unwrap();
        let (summary, text) = run_text(&suite);
        assert_eq!((summary.succeeded, summary.failed), (2, 1));
        assert!(text.contains("success: 0\n"));
        assert!(text.contains("failure: 3 - 3\n     code: (3 - 3) != 0\n"));
        assert!(text.contains("success: 2 < 3\n"));
    }

    #[test]
    fn test_nested_contexts_indent() {
        let suite = parse(
            "nest.yaml",
            r#"
suite: nest
steps:
  - context: "level {}"
    args: [1]
    steps:
      - context: level 2
        steps:
          - pending: deep
      - pending: shallow
"#,
        )
        .unwrap();
        let (_, text) = run_text(&suite);
        assert!(text.contains("context: level 1\n    context: level 2\n        pending: deep\n    pending: shallow\n"));
    }

    #[test]
    fn test_expression_error_names_location() {
        let err = parse(
            "bad.yaml",
            "suite: bad\nsteps:\n  - context: outer\n    steps:\n      - assert_zero: 1 / 0\n",
        )
        .unwrap_err();
        match &err {
            ScriptError::Expression { location, .. } => {
                assert_eq!(location, "bad.yaml: bad > outer > step 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_template_error() {
        let err = parse("t.yaml", "suite: t\nsteps:\n  - pending: \"needs {}\"\n").unwrap_err();
        assert!(matches!(err, ScriptError::Template { .. }));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let err = parse("u.yaml", "suite: u\nsteps:\n  - skip: nope\n").unwrap_err();
        assert!(matches!(err, ScriptError::Yaml { .. }));
        let err = parse("u.yaml", "suite: u\nsteps:\n  - pending: a\n    extra: b\n").unwrap_err();
        assert!(matches!(err, ScriptError::Yaml { .. }));
    }

    #[test]
    fn test_error_in_nested_step_names_it() {
        let err = parse(
            "n.yaml",
            "suite: n\nsteps:\n  - pending: fine\n  - context: outer\n    steps:\n      - pending: ok\n      - assert_zero: 0\n        colour: red\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Yaml { .. }));
        let message = err.to_string();
        assert!(
            message.contains("step 2: context step: step 2: assert_zero step: unknown field `colour`"),
            "{message}"
        );
    }

    #[test]
    fn test_step_needs_exactly_one_kind() {
        let err = parse("k.yaml", "suite: k\nsteps:\n  - pending: a\n    check: 1\n").unwrap_err();
        assert!(err.to_string().contains("step 1: `check` and `pending` cannot share one step"));
        let err = parse("k.yaml", "suite: k\nsteps:\n  - just text\n").unwrap_err();
        assert!(err.to_string().contains("step 1: expected a mapping"));
    }

    #[test]
    fn test_unquoted_non_integer_expressions_are_rejected() {
        let err = parse("f.yaml", "suite: f\nsteps:\n  - assert_zero: 2.5\n").unwrap_err();
        assert!(err.to_string().contains("quote it"), "{err}");
        let err = parse("b.yaml", "suite: b\nsteps:\n  - check: true\n").unwrap_err();
        assert!(err.to_string().contains("is a boolean"), "{err}");

        let suite = parse("q.yaml", "suite: q\nsteps:\n  - assert_zero: \"2 - 2\"\n").unwrap();
        let (summary, text) = run_text(&suite);
        assert_eq!(summary.succeeded, 1);
        assert!(text.contains("success: 2 - 2\n"));
    }

    #[test]
    fn test_empty_suite_runs() {
        let suite = parse("e.yaml", "suite: empty\n").unwrap();
        let (summary, text) = run_text(&suite);
        assert_eq!(summary, Summary::default());
        assert_eq!(text, "start: empty\n");
    }
}
