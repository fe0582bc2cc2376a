//! Main module for the grammar engine

pub mod expr;
pub mod kind;
pub mod node;
pub mod scanner;
pub mod shape;
pub mod snapshot;
pub mod token;
pub mod treeviz;
pub mod validate;

pub use expr::{GrammarExpr, Pattern, PatternError, Terminal};
pub use kind::{NodeKind, Strategy, Validator};
pub use node::{Exp, Node};
pub use scanner::{CacheEntry, Scanner};
pub use shape::{
    at_least, at_most, choice, group, kind, lazy, limits, lit, optional, pat, Shape, Term,
};
pub use snapshot::{ExpSnapshot, NodeSnapshot};
pub use token::Token;
pub use validate::Diagnostic;
