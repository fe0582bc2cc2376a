//! Grammar expressions - the unit of grammar composition
//!
//! A grammar expression matches one run of occurrences against a scanner.
//! The matcher variants are: a literal, an anchored pattern, a reference to
//! a node kind, an ordered alternation (first match wins), an inline
//! sub-shape, and a lazy thunk for forward references. Every expression
//! additionally carries repetition bounds (`min`/`max`), an optional
//! right-delimiter whose sighting terminates repetition, and an optional
//! expectation message used by missing-element diagnostics.
//!
//! Patterns are rewritten on construction: a leading `^` is stripped and
//! the body is compiled anchored, so a match attempt can only succeed at
//! the position the scanner hands it. Patterns that can match the empty
//! string are rejected.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::grammar::kind::NodeKind;
use crate::grammar::node::Exp;
use crate::grammar::scanner::Scanner;
use crate::grammar::shape::{Shape, Term};

/// Error type for grammar pattern construction
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// The regex source failed to compile
    Invalid { pattern: String, error: String },
    /// The pattern can match the empty string, which would stall repetition
    MatchesEmpty(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Invalid { pattern, error } => {
                write!(f, "Invalid grammar pattern `{}`: {}", pattern, error)
            }
            PatternError::MatchesEmpty(pattern) => {
                write!(f, "Grammar pattern `{}` matches the empty string", pattern)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// An anchored regular expression usable in grammar shapes.
///
/// The stored regex is compiled as `^(?:body)` and matched against the tail
/// of the input starting at the scanner's taste cursor, which pins every
/// match attempt to that exact position.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an anchored pattern. A leading `^` in `source` is stripped
    /// before anchoring, so author regexes may carry one or not.
    pub fn new(source: &str) -> Result<Self, PatternError> {
        let body = source.strip_prefix('^').unwrap_or(source);
        let regex = Regex::new(&format!("^(?:{})", body)).map_err(|e| PatternError::Invalid {
            pattern: source.to_string(),
            error: e.to_string(),
        })?;
        if regex.find("").is_some() {
            return Err(PatternError::MatchesEmpty(source.to_string()));
        }
        Ok(Self {
            source: body.to_string(),
            regex,
        })
    }

    /// The normalized pattern body (without the anchoring wrapper).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Attempt an anchored match at `pos`. Positions outside the text (or
    /// inside a multi-byte character) fail quietly.
    pub(crate) fn match_at<'t>(&self, text: &'t str, pos: usize) -> Option<&'t str> {
        let rest = text.get(pos..)?;
        self.regex.find(rest).map(|m| m.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// The matchable leaves of a grammar: a literal string or an anchored
/// pattern. These are the only forms the scanner itself understands, and
/// the only forms a right-delimiter may take.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Literal(String),
    Pattern(Pattern),
}

impl Terminal {
    /// The literal text or pattern body, as used for token provenance.
    pub fn source(&self) -> &str {
        match self {
            Terminal::Literal(lit) => lit,
            Terminal::Pattern(pattern) => pattern.source(),
        }
    }
}

/// A forward reference: a thunk producing an author item, resolved on first
/// use and memoized in place (clones share the memoized resolution).
#[derive(Clone)]
pub(crate) struct LazyMatcher {
    thunk: Arc<dyn Fn() -> Term + Send + Sync>,
    resolved: Arc<OnceCell<Box<GrammarExpr>>>,
}

impl LazyMatcher {
    pub(crate) fn new(thunk: Arc<dyn Fn() -> Term + Send + Sync>) -> Self {
        Self {
            thunk,
            resolved: Arc::new(OnceCell::new()),
        }
    }

    fn resolve(&self) -> &GrammarExpr {
        self.resolved
            .get_or_init(|| Box::new(GrammarExpr::from_term((self.thunk)())))
    }
}

impl fmt::Debug for LazyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(expr) => write!(f, "Lazy(resolved: {:?})", expr),
            None => write!(f, "Lazy(<unresolved>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    Terminal(Terminal),
    Kind(Arc<NodeKind>),
    Choice(Vec<GrammarExpr>),
    Group(Arc<NodeKind>),
    Lazy(LazyMatcher),
}

/// One position of a [`Shape`]: a matcher plus its repetition bounds,
/// optional right-delimiter, and optional expectation message.
#[derive(Debug, Clone)]
pub struct GrammarExpr {
    matcher: Matcher,
    min: usize,
    max: usize,
    right_delimiter: Option<Terminal>,
    expected: Option<String>,
}

impl GrammarExpr {
    pub(crate) fn new(matcher: Matcher) -> Self {
        Self {
            matcher,
            min: 1,
            max: 1,
            right_delimiter: None,
            expected: None,
        }
    }

    /// Normalize an author item into a grammar expression. Limit
    /// descriptors are not expressions; reaching one here is a grammar
    /// authoring error.
    pub(crate) fn from_term(term: Term) -> Self {
        match term {
            Term::Literal(lit) => Self::new(Matcher::Terminal(Terminal::Literal(lit))),
            Term::Pattern(pattern) => Self::new(Matcher::Terminal(Terminal::Pattern(pattern))),
            Term::Kind(kind) => Self::new(Matcher::Kind(kind)),
            Term::Choice(items) => Self::new(Matcher::Choice(
                items.into_iter().map(Self::from_term).collect(),
            )),
            Term::Group(shape) => Self::new(Matcher::Group(NodeKind::anonymous(shape))),
            Term::Lazy(thunk) => Self::new(Matcher::Lazy(LazyMatcher::new(thunk))),
            Term::Expected(inner, message) => {
                let mut expr = Self::from_term(*inner);
                expr.expected = Some(message);
                expr
            }
            Term::Limits { .. } => {
                panic!("a limit descriptor must follow a grammar expression")
            }
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn right_delimiter(&self) -> Option<&Terminal> {
        self.right_delimiter.as_ref()
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub(crate) fn apply_limits(&mut self, min: Option<usize>, max: Option<usize>) {
        if let Some(min) = min {
            self.min = min;
        }
        if let Some(max) = max {
            self.max = max.max(1);
        }
    }

    pub(crate) fn set_right_delimiter(&mut self, terminal: Terminal) {
        self.right_delimiter = Some(terminal);
    }

    /// The matcher with lazy references resolved (memoizing on first use).
    fn effective(&self) -> &Matcher {
        let mut matcher = &self.matcher;
        while let Matcher::Lazy(lazy) = matcher {
            matcher = &lazy.resolve().matcher;
        }
        matcher
    }

    /// The terminal this expression matches directly, if any. Resolves a
    /// lazy reference, so this must only be used at parse time.
    pub(crate) fn terminal(&self) -> Option<&Terminal> {
        match self.effective() {
            Matcher::Terminal(terminal) => Some(terminal),
            _ => None,
        }
    }

    /// Like [`terminal`](Self::terminal) but without resolving lazy
    /// references, safe during shape construction when forward references
    /// may not exist yet. A lazy item is not a plain literal/pattern.
    pub(crate) fn syntactic_terminal(&self) -> Option<&Terminal> {
        match &self.matcher {
            Matcher::Terminal(terminal) => Some(terminal),
            _ => None,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal().is_some()
    }

    /// Parse one occurrence-run of this expression.
    ///
    /// Whitespace ahead of each occurrence is captured as explicit tokens.
    /// The right-delimiter check is skipped on the first iteration so at
    /// least one attempt is always made. On failure below `min`, the
    /// cursor is restored to the entry position and nothing is returned;
    /// a failure at or above `min` ends the run at its lower bound.
    pub fn parse(&self, scanner: &mut Scanner) -> Option<Vec<Exp>> {
        let start_cursor = scanner.cursor();
        let mut results: Vec<Exp> = Vec::new();
        let mut occurrence = 0;
        while occurrence < self.max {
            if occurrence > 0 {
                if let Some(delimiter) = &self.right_delimiter {
                    if scanner.taste(delimiter).is_some() {
                        break;
                    }
                }
            }
            while let Some(ws) = scanner.eat_whitespace() {
                results.push(Exp::Token(ws));
            }
            let before = scanner.cursor();
            match self.parse_once(scanner) {
                Some(children) => {
                    results.extend(children);
                    occurrence += 1;
                    // a zero-width occurrence would repeat forever
                    if scanner.cursor() == before {
                        break;
                    }
                }
                None if occurrence >= self.min => break,
                None => {
                    scanner.set_cursor(start_cursor);
                    return None;
                }
            }
        }
        Some(results)
    }

    /// Match a single occurrence of the effective matcher.
    fn parse_once(&self, scanner: &mut Scanner) -> Option<Vec<Exp>> {
        match self.effective() {
            Matcher::Terminal(terminal) => {
                scanner.eat(terminal).map(|token| vec![Exp::Token(token)])
            }
            Matcher::Kind(kind) => {
                if !lead_matches(kind.shape(), scanner) {
                    return None;
                }
                kind.parse(scanner).map(|exp| vec![exp])
            }
            Matcher::Group(kind) => {
                if !lead_matches(kind.shape(), scanner) {
                    return None;
                }
                kind.parse(scanner).map(|exp| match exp {
                    Exp::Node(node) if Arc::ptr_eq(node.kind(), kind) => node.into_exps(),
                    other => vec![other],
                })
            }
            Matcher::Choice(branches) => {
                branches.iter().find_map(|branch| branch.parse_once(scanner))
            }
            // effective() never yields Lazy
            Matcher::Lazy(_) => None,
        }
    }
}

/// Lead-terminal short-circuit: when a referenced shape opens with a
/// literal or pattern, a failed lookahead on that lead avoids descending
/// into the kind at all.
fn lead_matches(shape: &Shape, scanner: &mut Scanner) -> bool {
    match shape.lead_terminal() {
        Some(terminal) => scanner.taste(terminal).is_some(),
        None => true,
    }
}
