//! # grammar-engine
//!
//! A library for building recursive-descent parsers from declarative
//! grammar definitions. Grammar authors declare node kinds - each a name
//! plus a [`Shape`](grammar::Shape), an ordered list of grammar
//! expressions - and the engine produces a concrete syntax tree that
//! preserves every consumed character, whitespace included.
//!
//! ```
//! use std::sync::Arc;
//! use grammar_engine::grammar::{kind, lit, pat, NodeKind, Scanner, Shape};
//!
//! let number = Arc::new(NodeKind::new("number", Shape::of([pat(r"\d+")])));
//! let sum = Arc::new(NodeKind::new(
//!     "sum",
//!     Shape::of([kind(&number), lit("+"), kind(&number)]),
//! ));
//!
//! let mut scanner = Scanner::new("2 + 3");
//! let tree = sum.parse(&mut scanner).unwrap();
//! assert_eq!(tree.text(), "2 + 3");
//! ```

pub mod grammar;
