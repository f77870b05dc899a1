use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use super::expr::ExprError;
use crate::render::TemplateError;

/// Errors raised while loading a suite file. Every one of them is detected before
/// the suite starts running.
#[derive(Debug, Error, Diagnostic)]
pub enum ScriptError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(nestspec::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid suite file {origin}: {source}")]
    #[diagnostic(
        code(nestspec::yaml),
        help("each step needs exactly one of `context`, `assert_zero`, `assert_nonzero`, `check` or `pending`")
    )]
    Yaml {
        origin: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid expression at {location}: {source}")]
    #[diagnostic(code(nestspec::expression))]
    Expression {
        location: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source]
        source: ExprError,
    },

    #[error("invalid message at {location}: {source}")]
    #[diagnostic(
        code(nestspec::template),
        help("use `{{}}` or `{{N}}` placeholders with a matching `args` list; write `{{{{` for a literal brace")
    )]
    Template {
        location: String,
        #[source]
        source: TemplateError,
    },
}

impl ScriptError {
    pub(crate) fn yaml(origin: &str, text: &str, source: serde_yaml::Error) -> Self {
        let span = source
            .location()
            .map(|loc| SourceSpan::from((loc.index(), 1)));
        ScriptError::Yaml {
            origin: origin.to_string(),
            src: NamedSource::new(origin, text.to_string()),
            span,
            source,
        }
    }

    pub(crate) fn expression(location: String, text: &str, source: ExprError) -> Self {
        let span = source.span().map(|r| {
            let len = (r.end - r.start).max(1);
            SourceSpan::from((r.start, len))
        });
        ScriptError::Expression {
            src: NamedSource::new(location.clone(), text.to_string()),
            location,
            span,
            source,
        }
    }
}
