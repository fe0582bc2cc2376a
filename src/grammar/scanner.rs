//! Scanner - cursor-based input matching with line and indent accounting
//!
//! The scanner owns the input string and exposes two matching primitives:
//! `taste` (lookahead, never moves the main cursor) and `eat` (consume,
//! producing a [`Token`]). Both skip leading runs of spaces and newlines
//! before attempting a match, so grammar shapes never have to mention
//! whitespace; `eat_whitespace` is the one skip-suppressed primitive used
//! to capture those runs as explicit tokens in the parse tree.
//!
//! Line, column, and indent lookups are served from tables precomputed at
//! construction: the input split at line feeds, per-line `(start, end)`
//! offset pairs, and per-line leading-space counts. A position equal to a
//! line's `end` (the separating newline) belongs to that line.
//!
//! The scanner never raises: every matching primitive returns a match or
//! nothing, and positions past the end of input simply fail to match.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::grammar::expr::{Pattern, Terminal};
use crate::grammar::node::Exp;
use crate::grammar::token::Token;

/// Whitespace as consumed between grammar expressions: a run of spaces
/// optionally followed by a single newline, or a bare newline.
pub(crate) static WHITESPACE: Lazy<Pattern> =
    Lazy::new(|| Pattern::new(" +\n?|\n").expect("whitespace pattern compiles"));

/// A memoized parse outcome for the author-facing keyed cache.
///
/// `result` is the child produced at the keyed position (or `None` for a
/// memoized failure); `end` is the cursor position after the parse, so a
/// cache hit can be replayed with `set_cursor(end)`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: Option<Exp>,
    pub end: usize,
}

/// Cursor-based scanner over an immutable input string.
#[derive(Debug)]
pub struct Scanner {
    text: String,
    cursor: usize,
    taste_cursor: usize,
    cursor_stack: Vec<usize>,
    lines: Vec<String>,
    line_offsets: Vec<(usize, usize)>,
    line_indents: Vec<usize>,
    cache: HashMap<(String, usize), CacheEntry>,
}

impl Scanner {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();

        let mut line_offsets = Vec::with_capacity(lines.len());
        let mut line_indents = Vec::with_capacity(lines.len());
        let mut start = 0;
        for line in &lines {
            let end = start + line.len();
            line_offsets.push((start, end));
            line_indents.push(line.len() - line.trim_start_matches(' ').len());
            start = end + 1;
        }

        Self {
            text,
            cursor: 0,
            taste_cursor: 0,
            cursor_stack: Vec::new(),
            lines,
            line_offsets,
            line_indents,
            cache: HashMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to an absolute position. Positions past the end of
    /// input are permitted; matching simply fails there.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &str {
        self.text.get(self.cursor..).unwrap_or("")
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.text.len()
    }

    // ------------------------------------------------------------------
    // Cursor stack
    // ------------------------------------------------------------------

    /// Snapshot the current cursor onto the stack.
    pub fn push_cursor(&mut self) {
        self.cursor_stack.push(self.cursor);
    }

    /// Restore (and discard) the top cursor snapshot. Popping an empty
    /// stack is a no-op.
    pub fn pop_cursor(&mut self) {
        if let Some(saved) = self.cursor_stack.pop() {
            self.cursor = saved;
        }
    }

    // ------------------------------------------------------------------
    // Matching primitives
    // ------------------------------------------------------------------

    /// Lookahead: attempt to match `terminal` past any leading whitespace,
    /// without moving the main cursor. Returns the matched text.
    pub fn taste(&mut self, terminal: &Terminal) -> Option<String> {
        self.taste_cursor = self.skip_whitespace_from(self.cursor);
        let value = match terminal {
            Terminal::Literal(lit) => {
                let rest = self.text.get(self.taste_cursor..)?;
                if rest.starts_with(lit.as_str()) {
                    lit.clone()
                } else {
                    return None;
                }
            }
            Terminal::Pattern(pattern) => pattern.match_at(&self.text, self.taste_cursor)?.to_string(),
        };
        self.taste_cursor += value.len();
        Some(value)
    }

    /// Consume: `taste` then commit. On success the cursor advances past
    /// the match and a [`Token`] positioned at the match start (after the
    /// whitespace skip) is returned; on failure the cursor is untouched.
    pub fn eat(&mut self, terminal: &Terminal) -> Option<Token> {
        let value = self.taste(terminal)?;
        let start = self.taste_cursor - value.len();
        let token = self.token_at(terminal.source().to_string(), value, start);
        self.cursor = token.end;
        Some(token)
    }

    /// Match one whitespace run at the cursor itself, with the implicit
    /// skip suppressed. This is how whitespace becomes explicit tokens in
    /// parse trees rather than silently vanishing.
    pub fn eat_whitespace(&mut self) -> Option<Token> {
        let value = WHITESPACE.match_at(&self.text, self.cursor)?.to_string();
        let token = self.token_at(WHITESPACE.source().to_string(), value, self.cursor);
        self.cursor = token.end;
        Some(token)
    }

    /// A missing-element sentinel positioned at the current cursor.
    pub fn missing_token(&self, expected: Option<String>) -> Token {
        let line = self.line_at(self.cursor);
        let col = self.cursor.saturating_sub(self.line_offsets[line].0);
        Token::new_missing(self.cursor, line, col, self.line_indents[line], expected)
    }

    fn token_at(&self, pattern: String, value: String, start: usize) -> Token {
        let line = self.line_at(start);
        let col = start.saturating_sub(self.line_offsets[line].0);
        Token::new(pattern, value, start, line, col, self.line_indents[line])
    }

    /// Position of the next non-whitespace character at or after the
    /// cursor, if any.
    pub(crate) fn next_content_pos(&self) -> Option<usize> {
        let pos = self.skip_whitespace_from(self.cursor);
        (pos < self.text.len()).then_some(pos)
    }

    fn skip_whitespace_from(&self, mut pos: usize) -> usize {
        let bytes = self.text.as_bytes();
        while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\n') {
            pos += 1;
        }
        pos
    }

    // ------------------------------------------------------------------
    // Line and indent accounting
    // ------------------------------------------------------------------

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }

    /// Absolute offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_offsets.get(line).map(|&(start, _)| start)
    }

    /// Absolute offset one past the last character of `line`, excluding the
    /// separating newline.
    pub fn line_end(&self, line: usize) -> Option<usize> {
        self.line_offsets.get(line).map(|&(_, end)| end)
    }

    /// Count of leading spaces on `line`.
    pub fn line_indent(&self, line: usize) -> Option<usize> {
        self.line_indents.get(line).copied()
    }

    /// Offset of the first non-space character of `line`.
    pub fn line_content_start(&self, line: usize) -> Option<usize> {
        Some(self.line_start(line)? + self.line_indent(line)?)
    }

    /// Offset one past the last non-whitespace character of `line`.
    pub fn line_content_end(&self, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        Some(start + self.lines.get(line)?.trim_end().len())
    }

    /// The line containing the cursor. A position equal to a line's `end`
    /// belongs to that line, so a cursor sitting on a newline is classified
    /// as the line the newline terminates.
    pub fn current_line(&self) -> usize {
        self.line_at(self.cursor)
    }

    /// Column of the cursor within its line.
    pub fn current_col(&self) -> usize {
        let line = self.current_line();
        self.cursor.saturating_sub(self.line_offsets[line].0)
    }

    /// The line containing an arbitrary position, by binary search over the
    /// offset table. Positions past the end of input map to the last line.
    pub fn line_at(&self, pos: usize) -> usize {
        let idx = self.line_offsets.partition_point(|&(start, _)| start <= pos);
        idx.saturating_sub(1)
    }

    /// Every line index whose `[start, end]` interval overlaps `[from, to]`
    /// inclusively.
    pub fn lines_in_range(&self, from: usize, to: usize) -> Vec<usize> {
        if from > to {
            return Vec::new();
        }
        let first = self.line_at(from);
        let last = self.line_at(to);
        (first..=last)
            .filter(|&i| {
                let (start, end) = self.line_offsets[i];
                start <= to && end >= from
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Keyed parse cache
    // ------------------------------------------------------------------

    /// Look up a memoized outcome for `(name, pos)`. The core driver never
    /// consults this cache; it exists for grammar authors implementing
    /// Packrat-style memoization.
    pub fn cache_get(&self, name: &str, pos: usize) -> Option<&CacheEntry> {
        self.cache.get(&(name.to_string(), pos))
    }

    pub fn cache_set(&mut self, name: impl Into<String>, pos: usize, entry: CacheEntry) {
        self.cache.insert((name.into(), pos), entry);
    }
}
