//! Shape - the ordered body of a node kind
//!
//! Grammar is data, not code: authors describe a node kind as a flat,
//! positional list of items, and `Shape::of` normalizes that list into the
//! grammar expressions the parse driver consumes. Two sugars are recognized
//! during normalization:
//!
//! 1. a limit descriptor (`limits`/`optional`) binds repetition bounds to
//!    the item immediately before it;
//! 2. a literal or pattern following an expression (with an optional limit
//!    descriptor in between) is additionally recorded as that expression's
//!    right-delimiter, while remaining a shape position of its own.
//!
//! A list value (`choice`) is ordered alternation; a `Shape` value
//! (`group`) is an inline grouped sequence. The two are distinct and never
//! collapsed into one another.

use std::sync::Arc;

use crate::grammar::expr::{GrammarExpr, Pattern, Terminal};
use crate::grammar::kind::NodeKind;

/// An author-level grammar item, as accepted positionally by [`Shape::of`].
#[derive(Clone)]
pub enum Term {
    /// A non-empty literal string.
    Literal(String),
    /// An anchored pattern.
    Pattern(Pattern),
    /// A reference to a node kind.
    Kind(Arc<NodeKind>),
    /// Ordered alternation over items; first match wins.
    Choice(Vec<Term>),
    /// An inline grouped sequence.
    Group(Shape),
    /// A thunk resolved on first use, for forward references.
    Lazy(Arc<dyn Fn() -> Term + Send + Sync>),
    /// An item carrying an expectation message for diagnostics.
    Expected(Box<Term>, String),
    /// A repetition descriptor applying to the preceding item.
    Limits {
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl Term {
    /// Attach an expectation message, reported when a partial parse has to
    /// substitute a missing-element sentinel for this item.
    pub fn expected(self, message: &str) -> Term {
        Term::Expected(Box::new(self), message.to_string())
    }
}

/// A literal item. Literals are finite and non-empty.
pub fn lit(text: &str) -> Term {
    assert!(!text.is_empty(), "grammar literals must be non-empty");
    Term::Literal(text.to_string())
}

/// A pattern item. Panics if the regex is invalid or can match the empty
/// string; grammar tables are static author code, so a bad pattern is a
/// programmer error surfaced at construction.
pub fn pat(source: &str) -> Term {
    match Pattern::new(source) {
        Ok(pattern) => Term::Pattern(pattern),
        Err(error) => panic!("{}", error),
    }
}

/// A reference to a node kind.
pub fn kind(kind: &Arc<NodeKind>) -> Term {
    Term::Kind(Arc::clone(kind))
}

/// A forward reference, resolved on first use and memoized.
pub fn lazy<F>(thunk: F) -> Term
where
    F: Fn() -> Term + Send + Sync + 'static,
{
    Term::Lazy(Arc::new(thunk))
}

/// Ordered alternation; branches are tried left to right.
pub fn choice<I>(items: I) -> Term
where
    I: IntoIterator<Item = Term>,
{
    Term::Choice(items.into_iter().collect())
}

/// An inline grouped sequence.
pub fn group(shape: Shape) -> Term {
    Term::Group(shape)
}

/// A repetition descriptor for the preceding item: at least `min`, at most
/// `max` occurrences (`usize::MAX` for unbounded).
pub fn limits(min: usize, max: usize) -> Term {
    assert!(max >= 1, "repetition upper bound must be at least 1");
    Term::Limits {
        min: Some(min),
        max: Some(max),
    }
}

/// A lower-bound-only descriptor for the preceding item.
pub fn at_least(min: usize) -> Term {
    Term::Limits {
        min: Some(min),
        max: None,
    }
}

/// An upper-bound-only descriptor for the preceding item.
pub fn at_most(max: usize) -> Term {
    assert!(max >= 1, "repetition upper bound must be at least 1");
    Term::Limits {
        min: None,
        max: Some(max),
    }
}

/// Shorthand for `limits(0, 1)`.
pub fn optional() -> Term {
    limits(0, 1)
}

/// An ordered sequence of grammar expressions defining a node kind's body.
#[derive(Debug, Clone)]
pub struct Shape {
    exprs: Vec<GrammarExpr>,
}

impl Shape {
    /// Build a shape from a positional author list, applying the limit
    /// descriptor and right-delimiter sugars.
    pub fn of<I>(items: I) -> Shape
    where
        I: IntoIterator<Item = Term>,
    {
        let mut exprs: Vec<GrammarExpr> = Vec::new();
        for item in items {
            match item {
                Term::Limits { min, max } => {
                    if let Some(last) = exprs.last_mut() {
                        last.apply_limits(min, max);
                    }
                }
                other => exprs.push(GrammarExpr::from_term(other)),
            }
        }

        // A terminal in the following position doubles as the preceding
        // expression's right-delimiter while keeping its own position.
        for i in 1..exprs.len() {
            if let Some(terminal) = exprs[i].syntactic_terminal().cloned() {
                exprs[i - 1].set_right_delimiter(terminal);
            }
        }

        Shape { exprs }
    }

    pub(crate) fn from_exprs(exprs: Vec<GrammarExpr>) -> Shape {
        Shape { exprs }
    }

    pub fn exprs(&self) -> &[GrammarExpr] {
        &self.exprs
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// The opening terminal of this shape, if its first expression matches
    /// a literal or pattern directly. Used for the descent short-circuit.
    pub(crate) fn lead_terminal(&self) -> Option<&Terminal> {
        self.exprs.first().and_then(GrammarExpr::terminal)
    }
}
