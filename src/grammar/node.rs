//! Parse-tree nodes
//!
//! A successful parse produces a concrete tree: nodes carry their kind and
//! the ordered children actually matched, and every consumed character of
//! the input - whitespace included - survives as a token somewhere in the
//! tree. Derived views (`tokens`, `content_tokens`, `text`, line extents)
//! are computed on demand; nodes are immutable once returned by a parse.

use std::sync::Arc;

use crate::grammar::kind::NodeKind;
use crate::grammar::token::Token;
use crate::grammar::validate::{validate_node, Diagnostic};

/// One child of a parse tree: a consumed token or a nested node.
#[derive(Debug, Clone)]
pub enum Exp {
    Token(Token),
    Node(Node),
}

impl Exp {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Exp::Token(token) => Some(token),
            Exp::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Exp::Node(node) => Some(node),
            Exp::Token(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Exp::Node(node) => Some(node),
            Exp::Token(_) => None,
        }
    }

    /// Nodes always count as content; tokens count when their trimmed
    /// value is non-empty.
    pub fn is_content(&self) -> bool {
        match self {
            Exp::Token(token) => token.is_content(),
            Exp::Node(_) => true,
        }
    }

    /// Pre-order flattening of all tokens under this child.
    pub fn tokens(&self) -> Vec<&Token> {
        match self {
            Exp::Token(token) => vec![token],
            Exp::Node(node) => node.tokens(),
        }
    }

    /// Concatenation of all token values, whitespace preserved.
    pub fn text(&self) -> String {
        self.tokens().iter().map(|t| t.value.as_str()).collect()
    }
}

/// A parse-tree node: the kind that produced it plus the children matched
/// by its shape, in order.
#[derive(Debug, Clone)]
pub struct Node {
    kind: Arc<NodeKind>,
    exps: Vec<Exp>,
}

impl Node {
    pub(crate) fn new(kind: Arc<NodeKind>, exps: Vec<Exp>) -> Self {
        Self { kind, exps }
    }

    pub fn kind(&self) -> &Arc<NodeKind> {
        &self.kind
    }

    /// The declaring kind's name.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// The ordered children actually matched.
    pub fn exps(&self) -> &[Exp] {
        &self.exps
    }

    pub(crate) fn into_exps(self) -> Vec<Exp> {
        self.exps
    }

    /// Pre-order flattening of all contained tokens.
    pub fn tokens(&self) -> Vec<&Token> {
        self.exps.iter().flat_map(Exp::tokens).collect()
    }

    /// Children with pure-whitespace tokens filtered out.
    pub fn content_exps(&self) -> Vec<&Exp> {
        self.exps.iter().filter(|e| e.is_content()).collect()
    }

    /// Flattened tokens with pure-whitespace tokens filtered out.
    pub fn content_tokens(&self) -> Vec<&Token> {
        self.tokens().into_iter().filter(|t| t.is_content()).collect()
    }

    /// Concatenation of all token values in order, whitespace preserved.
    /// Equals the input substring from the start of the first token to the
    /// end of the last.
    pub fn text(&self) -> String {
        self.tokens().iter().map(|t| t.value.as_str()).collect()
    }

    /// Line of the first token (0 for an empty node).
    pub fn line(&self) -> usize {
        self.tokens().first().map_or(0, |t| t.line)
    }

    /// Column of the first token (0 for an empty node).
    pub fn col(&self) -> usize {
        self.tokens().first().map_or(0, |t| t.col)
    }

    /// Smallest line index spanned by this node's tokens.
    pub fn line_start(&self) -> usize {
        self.tokens().iter().map(|t| t.line).min().unwrap_or(0)
    }

    /// Largest line index spanned by this node's tokens.
    pub fn line_end(&self) -> usize {
        self.tokens().iter().map(|t| t.line).max().unwrap_or(0)
    }

    /// Collect diagnostics for this tree: one "missing element" entry per
    /// missing-token sentinel, plus whatever per-kind validators report.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        validate_node(self, &mut diagnostics);
        diagnostics
    }
}
