//! The stack of nested descriptive contexts.

use std::fmt;

use crate::render::{out_of_memory, render_bounded};

/// One nested scope, e.g. "describing the parser" or "when the input is empty".
/// The description is rendered once, when the context is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    description: String,
}

impl Context {
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Live contexts, outermost first. The innermost one is the head; every level's
/// parent is the entry below it.
///
/// Popping an empty stack does nothing, so depth never drops below zero.
#[derive(Debug, Default)]
pub struct ContextStack {
    levels: Vec<Context>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, description: String) {
        if self.levels.try_reserve(1).is_err() {
            out_of_memory();
        }
        self.levels.push(Context { description });
        tracing::debug!(depth = self.levels.len(), "entered context");
    }

    /// Renders `description` into a buffer of `limit` bytes and pushes it.
    pub fn push_fmt(&mut self, description: fmt::Arguments<'_>, limit: usize) {
        self.push(render_bounded(description, limit).text);
    }

    pub fn pop(&mut self) -> Option<Context> {
        let popped = self.levels.pop();
        match popped {
            Some(_) => tracing::debug!(depth = self.levels.len(), "left context"),
            None => tracing::warn!("context exit without a matching entry ignored"),
        }
        popped
    }

    /// Closes every context above `depth`. Does nothing if the stack is already
    /// at or below it.
    pub fn truncate(&mut self, depth: usize) {
        if depth < self.levels.len() {
            self.levels.truncate(depth);
            tracing::debug!(depth, "closed contexts");
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The innermost context.
    pub fn head(&self) -> Option<&Context> {
        self.levels.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.levels.iter()
    }

    /// Descriptions from the outermost context inwards.
    pub fn path(&self) -> Vec<&str> {
        self.levels.iter().map(Context::description).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::COMMENT_SIZE;

    #[test]
    fn test_push_pop_tracks_depth() {
        let mut stack = ContextStack::new();
        stack.push("outer".into());
        stack.push("inner".into());
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.head().map(Context::description), Some("inner"));

        let popped = stack.pop().unwrap();
        assert_eq!(popped.description(), "inner");
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.head().map(Context::description), Some("outer"));
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut stack = ContextStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 0);

        stack.push("only".into());
        stack.pop();
        stack.pop();
        assert!(stack.is_empty());
        stack.push("again".into());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_fmt_renders_and_truncates() {
        let mut stack = ContextStack::new();
        stack.push_fmt(format_args!("when {} is {}", "input", "empty"), COMMENT_SIZE);
        stack.push_fmt(format_args!("{}", "z".repeat(100)), 11);
        assert_eq!(stack.path(), vec!["when input is empty", "zzzzzzzzzz"]);
    }

    #[test]
    fn test_truncate_only_shrinks() {
        let mut stack = ContextStack::new();
        for d in ["a", "b", "c"] {
            stack.push(d.into());
        }
        stack.truncate(1);
        assert_eq!(stack.path(), vec!["a"]);
        stack.truncate(3);
        assert_eq!(stack.path(), vec!["a"]);
        stack.truncate(0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_iter_is_outermost_first() {
        let mut stack = ContextStack::new();
        for d in ["a", "b", "c"] {
            stack.push(d.into());
        }
        let all: Vec<_> = stack.iter().map(Context::description).collect();
        assert_eq!(all, vec!["a", "b", "c"]);
    }
}
