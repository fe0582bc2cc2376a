//! Token - the immutable record of a consumed match
//!
//! A token is produced by the scanner each time a literal or pattern match
//! is consumed. It carries the matched text together with its position
//! metadata (byte range, line, column, and the indent of its line), so that
//! parse trees can reproduce the source exactly and diagnostics can point
//! at precise locations.

use serde::{Deserialize, Serialize};

/// A consumed match with position metadata.
///
/// Tokens are created by [`Scanner::eat`](crate::grammar::scanner::Scanner::eat)
/// and are immutable thereafter. A *missing* token is a synthetic sentinel
/// inserted by the partial-parse policy: its `value` is empty, `missing` is
/// true, and `expected` carries the expectation message (if any) of the
/// grammar expression that failed to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Source text of the literal or regex that produced this token.
    pub pattern: String,
    /// The matched substring.
    pub value: String,
    /// Byte offset of the first matched character.
    pub start: usize,
    /// Byte offset one past the last matched character (`end - start == value.len()`).
    pub end: usize,
    /// Zero-based line index of `start`.
    pub line: usize,
    /// Zero-based column of `start` within its line.
    pub col: usize,
    /// Leading-space count of the line containing `start`.
    pub indent: usize,
    /// True for the synthetic sentinel inserted when a shape position could
    /// not be matched under the partial-parse policy.
    pub missing: bool,
    /// Expectation message attached by the grammar author to the expression
    /// this sentinel stands in for.
    pub expected: Option<String>,
    /// Decoration slot for formatters: text to emit before the token.
    pub deco_before: Option<String>,
    /// Decoration slot for formatters: text to emit after the token.
    pub deco_after: Option<String>,
}

impl Token {
    pub(crate) fn new(
        pattern: String,
        value: String,
        start: usize,
        line: usize,
        col: usize,
        indent: usize,
    ) -> Self {
        let end = start + value.len();
        Self {
            pattern,
            value,
            start,
            end,
            line,
            col,
            indent,
            missing: false,
            expected: None,
            deco_before: None,
            deco_after: None,
        }
    }

    pub(crate) fn new_missing(
        start: usize,
        line: usize,
        col: usize,
        indent: usize,
        expected: Option<String>,
    ) -> Self {
        Self {
            pattern: String::new(),
            value: String::new(),
            start,
            end: start,
            line,
            col,
            indent,
            missing: true,
            expected,
            deco_before: None,
            deco_after: None,
        }
    }

    /// True when the token carries no visible text (whitespace runs and
    /// missing sentinels).
    pub fn is_whitespace(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// True when the token carries visible text.
    pub fn is_content(&self) -> bool {
        !self.is_whitespace()
    }
}
