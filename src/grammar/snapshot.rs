//! Parse-tree snapshots - a normalized serializable representation
//!
//! A snapshot captures the complete tree structure (kind names, token
//! values and positions) in plain data, so serializers and tests can work
//! with trees without re-implementing traversal, and without holding the
//! kind references the live tree carries.

use serde::{Deserialize, Serialize};

use crate::grammar::node::{Exp, Node};

/// A node in snapshot form: its kind name and its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub kind: String,
    pub exps: Vec<ExpSnapshot>,
}

/// One child in snapshot form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpSnapshot {
    Token {
        value: String,
        start: usize,
        end: usize,
        missing: bool,
    },
    Node(NodeSnapshot),
}

impl NodeSnapshot {
    /// Snapshot a live parse tree.
    pub fn of(node: &Node) -> Self {
        Self {
            kind: node.name().to_string(),
            exps: node.exps().iter().map(ExpSnapshot::of).collect(),
        }
    }
}

impl ExpSnapshot {
    pub fn of(exp: &Exp) -> Self {
        match exp {
            Exp::Token(token) => ExpSnapshot::Token {
                value: token.value.clone(),
                start: token.start,
                end: token.end,
                missing: token.missing,
            },
            Exp::Node(node) => ExpSnapshot::Node(NodeSnapshot::of(node)),
        }
    }
}
