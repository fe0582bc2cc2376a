//! Diagnostic collection over parse trees
//!
//! The engine itself reports only one diagnostic kind: a missing element,
//! contributed by each synthetic missing token that a partial parse left in
//! the tree. Grammar authors extend validation per node kind through the
//! validator hook on [`NodeKind`](crate::grammar::kind::NodeKind); hooks
//! run after the children of their node have been walked.
//!
//! Validation never fails and never raises - it returns a plain list.

use serde::{Deserialize, Serialize};

use crate::grammar::node::{Exp, Node};

/// A collected validation finding, positioned at a line and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

pub(crate) fn validate_node(node: &Node, out: &mut Vec<Diagnostic>) {
    for exp in node.exps() {
        match exp {
            Exp::Token(token) if token.missing => {
                let message = match &token.expected {
                    Some(expected) => format!("missing element: {}", expected),
                    None => "missing element".to_string(),
                };
                out.push(Diagnostic {
                    line: token.line,
                    col: token.col,
                    message,
                });
            }
            Exp::Node(child) => validate_node(child, out),
            Exp::Token(_) => {}
        }
    }
    if let Some(validator) = node.kind().validator() {
        validator(node, out);
    }
}
