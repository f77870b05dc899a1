//! Integer expressions for suite files.
//!
//! Supports `+ - * / %`, unary minus, parentheses and a single trailing comparison
//! (`== != < <= > >=`, yielding 1 or 0). Arithmetic is checked `i64`.

use std::ops::Range;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "script/expr.pest"]
struct ExprParser;

/// Why an expression could not be evaluated. Spans are byte ranges in the
/// expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("syntax error: {message}")]
    Syntax { message: String, span: Range<usize> },
    #[error("integer literal '{literal}' does not fit in 64 bits")]
    OutOfRange { literal: String, span: Range<usize> },
    #[error("arithmetic overflow in '{text}'")]
    Overflow { text: String, span: Range<usize> },
    #[error("division by zero in '{text}'")]
    DivisionByZero { text: String, span: Range<usize> },
    #[error("malformed expression tree")]
    Malformed,
}

impl ExprError {
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ExprError::Syntax { span, .. }
            | ExprError::OutOfRange { span, .. }
            | ExprError::Overflow { span, .. }
            | ExprError::DivisionByZero { span, .. } => Some(span.clone()),
            ExprError::Malformed => None,
        }
    }
}

/// Parses and evaluates `source`.
pub fn evaluate(source: &str) -> Result<i64, ExprError> {
    let mut pairs = ExprParser::parse(Rule::expression, source).map_err(syntax_error)?;
    let expression = next(&mut pairs)?;
    let comparison = next(&mut expression.into_inner())?;
    eval_comparison(comparison)
}

fn syntax_error(e: pest::error::Error<Rule>) -> ExprError {
    let span = match e.location {
        pest::error::InputLocation::Pos(pos) => pos..pos,
        pest::error::InputLocation::Span((start, end)) => start..end,
    };
    ExprError::Syntax {
        message: e.variant.message().into_owned(),
        span,
    }
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, ExprError> {
    pairs.next().ok_or(ExprError::Malformed)
}

fn span_of(pair: &Pair<'_, Rule>) -> Range<usize> {
    let span = pair.as_span();
    span.start()..span.end()
}

fn overflow(pair_text: &str, span: &Range<usize>) -> ExprError {
    ExprError::Overflow {
        text: pair_text.to_string(),
        span: span.clone(),
    }
}

fn eval_comparison(pair: Pair<'_, Rule>) -> Result<i64, ExprError> {
    let mut inner = pair.into_inner();
    let lhs = eval_sum(next(&mut inner)?)?;
    let Some(op) = inner.next() else {
        return Ok(lhs);
    };
    let rhs = eval_sum(next(&mut inner)?)?;
    let holds = match op.as_str() {
        "==" => lhs == rhs,
        "!=" => lhs != rhs,
        "<" => lhs < rhs,
        "<=" => lhs <= rhs,
        ">" => lhs > rhs,
        ">=" => lhs >= rhs,
        _ => return Err(ExprError::Malformed),
    };
    Ok(i64::from(holds))
}

fn eval_sum(pair: Pair<'_, Rule>) -> Result<i64, ExprError> {
    let (text, span) = (pair.as_str(), span_of(&pair));
    let mut inner = pair.into_inner();
    let mut acc = eval_product(next(&mut inner)?)?;
    while let Some(op) = inner.next() {
        let rhs = eval_product(next(&mut inner)?)?;
        acc = match op.as_str() {
            "+" => acc.checked_add(rhs),
            "-" => acc.checked_sub(rhs),
            _ => return Err(ExprError::Malformed),
        }
        .ok_or_else(|| overflow(text, &span))?;
    }
    Ok(acc)
}

fn eval_product(pair: Pair<'_, Rule>) -> Result<i64, ExprError> {
    let (text, span) = (pair.as_str(), span_of(&pair));
    let mut inner = pair.into_inner();
    let mut acc = eval_unary(next(&mut inner)?)?;
    while let Some(op) = inner.next() {
        let rhs = eval_unary(next(&mut inner)?)?;
        if rhs == 0 && op.as_str() != "*" {
            return Err(ExprError::DivisionByZero {
                text: text.to_string(),
                span,
            });
        }
        acc = match op.as_str() {
            "*" => acc.checked_mul(rhs),
            "/" => acc.checked_div(rhs),
            "%" => acc.checked_rem(rhs),
            _ => return Err(ExprError::Malformed),
        }
        .ok_or_else(|| overflow(text, &span))?;
    }
    Ok(acc)
}

fn eval_unary(pair: Pair<'_, Rule>) -> Result<i64, ExprError> {
    let (text, span) = (pair.as_str(), span_of(&pair));
    let mut negations = 0usize;
    let mut value = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::neg => negations += 1,
            Rule::integer => {
                let literal = part.as_str();
                value = Some(literal.parse::<i64>().map_err(|_| ExprError::OutOfRange {
                    literal: literal.to_string(),
                    span: span_of(&part),
                })?);
            }
            Rule::comparison => value = Some(eval_comparison(part)?),
            _ => return Err(ExprError::Malformed),
        }
    }
    let mut value = value.ok_or(ExprError::Malformed)?;
    for _ in 0..negations {
        value = value.checked_neg().ok_or_else(|| overflow(text, &span))?;
    }
    Ok(value)
}
