//! Message rendering for report lines.
//!
//! Two renderers live here. [`render_bounded`] turns Rust format arguments into a
//! size-limited string for the engine, and [`Template`] interpolates positional
//! arguments into runtime templates read from suite files.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::GraphemeCursor;

/// Size of the buffer a rendered message is written into, terminator slot included.
pub const COMMENT_SIZE: usize = 4096;

/// Spaces per nesting level.
pub const INDENT_SIZE: u8 = 4;

// ============================================================================
// BOUNDED RENDERING
// ============================================================================

/// A rendered message and whether anything was cut off to fit the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub truncated: bool,
}

/// Renders `args` into at most `limit - 1` bytes.
///
/// Overflowing text is dropped silently; the cut lands on a character boundary and,
/// where the cluster is visible within one formatting chunk, on a grapheme boundary.
pub fn render_bounded(args: fmt::Arguments<'_>, limit: usize) -> Rendered {
    let mut writer = BoundedWriter {
        buf: String::new(),
        cap: limit.saturating_sub(1),
        truncated: false,
    };
    if let Some(s) = args.as_str() {
        // Static messages skip the formatting machinery.
        let _ = writer.write_str(s);
    } else {
        let _ = writer.write_fmt(args);
    }
    if writer.truncated {
        tracing::debug!(limit, kept = writer.buf.len(), "message truncated");
    }
    Rendered {
        text: writer.buf,
        truncated: writer.truncated,
    }
}

struct BoundedWriter {
    buf: String,
    cap: usize,
    truncated: bool,
}

impl fmt::Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        let room = self.cap - self.buf.len();
        let take = if s.len() <= room {
            s.len()
        } else {
            self.truncated = true;
            grapheme_floor(s, char_floor(s, room))
        };
        reserve_or_abort(&mut self.buf, take);
        self.buf.push_str(&s[..take]);
        Ok(())
    }
}

fn char_floor(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn grapheme_floor(s: &str, index: usize) -> usize {
    let mut cursor = GraphemeCursor::new(index, s.len(), true);
    match cursor.is_boundary(s, 0) {
        Ok(true) => index,
        Ok(false) => match cursor.prev_boundary(s, 0) {
            Ok(Some(prev)) => prev,
            _ => index,
        },
        // The cluster started in an earlier chunk; a char boundary is the best we know.
        Err(_) => index,
    }
}

fn reserve_or_abort(buf: &mut String, additional: usize) {
    if buf.try_reserve(additional).is_err() {
        out_of_memory();
    }
}

/// Reports allocation exhaustion and aborts. A half-built context would leave the
/// nesting stack in an unknown state, so nothing is unwound.
pub(crate) fn out_of_memory() -> ! {
    eprintln!("out of memory, aborting...");
    std::process::abort()
}

// ============================================================================
// RUNTIME TEMPLATES
// ============================================================================

/// Errors raised while parsing or filling a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at byte {offset}")]
    UnclosedPlaceholder { offset: usize },
    #[error("unmatched '}}' at byte {offset}")]
    UnmatchedBrace { offset: usize },
    #[error("invalid placeholder '{{{placeholder}}}' at byte {offset}")]
    InvalidPlaceholder { placeholder: String, offset: usize },
    #[error("placeholder refers to argument {index} but only {available} given")]
    MissingArgument { index: usize, available: usize },
}

/// A scalar argument for a template placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Bool(b) => write!(f, "{}", b),
            Arg::Int(i) => write!(f, "{}", i),
            Arg::Float(x) => write!(f, "{}", x),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Argument(usize),
}

/// A message template with `{}` / `{N}` placeholders and `{{` / `}}` escapes.
///
/// `{}` takes the next argument in order, independent of any explicit `{N}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut next_implicit = 0;
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedPlaceholder { offset });
                    }
                    let index = if placeholder.is_empty() {
                        next_implicit += 1;
                        next_implicit - 1
                    } else {
                        placeholder.trim().parse::<usize>().map_err(|_| {
                            TemplateError::InvalidPlaceholder {
                                placeholder: placeholder.clone(),
                                offset,
                            }
                        })?
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Argument(index));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedBrace { offset }),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Number of arguments this template needs (highest referenced index + 1).
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Argument(i) => Some(i + 1),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn render(&self, args: &[Arg]) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Argument(index) => {
                    let arg = args.get(*index).ok_or(TemplateError::MissingArgument {
                        index: *index,
                        available: args.len(),
                    })?;
                    let _ = write!(out, "{}", arg);
                }
            }
        }
        Ok(out)
    }
}
