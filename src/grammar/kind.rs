//! Node kinds and the parse drivers
//!
//! A node kind is a user-defined grammar rule: a name, a [`Shape`], policy
//! flags, and a parse strategy. `parse` drives the shape against a scanner
//! and builds the resulting node. Three strategies exist:
//!
//! 1. Standard - each shape position in order, with the fallback and
//!    partial-parse policies.
//! 2. LeftRecursive - for chained binary forms: the first position is
//!    parsed once, then tails are folded in while the first position's
//!    right-delimiter keeps appearing, so chains build without unbounded
//!    descent.
//! 3. IndentBlock - children subordinate to the token just before the
//!    cursor, either inline on the same line or as a deeper-indented block.
//!
//! Backtracking discipline: every driver records the cursor at entry and
//! restores it when it returns nothing, so a failed parse is invisible to
//! the caller.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

use crate::grammar::expr::{Pattern, Terminal};
use crate::grammar::node::{Exp, Node};
use crate::grammar::scanner::Scanner;
use crate::grammar::shape::Shape;
use crate::grammar::token::Token;
use crate::grammar::validate::Diagnostic;

/// Per-kind validation hook, invoked by [`Node::validate`].
pub type Validator = Arc<dyn Fn(&Node, &mut Vec<Diagnostic>) + Send + Sync>;

/// Matches the single character in front of an indentation block's cursor.
static ANY_CHAR: Lazy<Terminal> =
    Lazy::new(|| Terminal::Pattern(Pattern::new(".").expect("any-char pattern compiles")));

/// How a kind's shape is driven against the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Standard,
    LeftRecursive,
    IndentBlock,
}

/// A user-defined grammar rule.
pub struct NodeKind {
    name: String,
    shape: Shape,
    strategy: Strategy,
    fallback_to_first_exp: bool,
    allow_incomplete_parse: bool,
    incomplete_parse_threshold: usize,
    validator: Option<Validator>,
    tail_kind: OnceCell<Arc<NodeKind>>,
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKind({})", self.name)
    }
}

impl NodeKind {
    pub fn new(name: &str, shape: Shape) -> NodeKind {
        NodeKind {
            name: name.to_string(),
            shape,
            strategy: Strategy::Standard,
            fallback_to_first_exp: true,
            allow_incomplete_parse: false,
            incomplete_parse_threshold: 1,
            validator: None,
            tail_kind: OnceCell::new(),
        }
    }

    /// The anonymous kind backing an inline sub-shape.
    pub(crate) fn anonymous(shape: Shape) -> Arc<NodeKind> {
        Arc::new(NodeKind::new("(group)", shape))
    }

    /// Use the left-recursive driver for this kind.
    pub fn left_recursive(mut self) -> Self {
        self.strategy = Strategy::LeftRecursive;
        self
    }

    /// Use the indentation-block driver for this kind.
    pub fn indent_block(mut self) -> Self {
        self.strategy = Strategy::IndentBlock;
        self
    }

    /// Disable the fallback-to-first-exp policy.
    pub fn without_fallback(mut self) -> Self {
        self.fallback_to_first_exp = false;
        self
    }

    /// Allow partial parses once at least `threshold` content children have
    /// accumulated; unmatched positions are filled with missing sentinels.
    pub fn allow_incomplete(mut self, threshold: usize) -> Self {
        self.allow_incomplete_parse = true;
        self.incomplete_parse_threshold = threshold;
        self
    }

    /// Attach a validation hook invoked by [`Node::validate`].
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Node, &mut Vec<Diagnostic>) + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub(crate) fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Parse one occurrence of this kind at the scanner's cursor.
    ///
    /// Returns the built node, or - under the fallback policy - the first
    /// successfully parsed child when the rest of the shape cannot
    /// complete. Returns nothing on failure, with the cursor restored to
    /// its entry position.
    pub fn parse(self: &Arc<Self>, scanner: &mut Scanner) -> Option<Exp> {
        match self.strategy {
            Strategy::Standard => self.parse_standard(scanner),
            Strategy::LeftRecursive => self.parse_left_recursive(scanner),
            Strategy::IndentBlock => self.parse_indent_block(scanner),
        }
    }

    // ------------------------------------------------------------------
    // Standard driver
    // ------------------------------------------------------------------

    fn parse_standard(self: &Arc<Self>, scanner: &mut Scanner) -> Option<Exp> {
        let start_cursor = scanner.cursor();
        let mut first_exp: Option<Exp> = None;
        let mut first_exp_cursor = start_cursor;
        let mut exps: Vec<Exp> = Vec::new();

        for (i, expr) in self.shape.exprs().iter().enumerate() {
            match expr.parse(scanner) {
                Some(children) => {
                    if i == 0 && !expr.is_terminal() {
                        if let Some(first) = children.iter().find(|e| e.is_content()) {
                            first_exp = Some(first.clone());
                            first_exp_cursor = scanner.cursor();
                        }
                    }
                    exps.extend(children);
                }
                None => {
                    let content_count = exps.iter().filter(|e| e.is_content()).count();
                    if self.allow_incomplete_parse
                        && content_count >= self.incomplete_parse_threshold
                    {
                        let expected = expr.expected().map(str::to_string);
                        exps.push(Exp::Token(scanner.missing_token(expected)));
                        continue;
                    }
                    if self.fallback_to_first_exp {
                        if let Some(first) = first_exp {
                            scanner.set_cursor(first_exp_cursor);
                            return Some(first);
                        }
                    }
                    scanner.set_cursor(start_cursor);
                    return None;
                }
            }
        }

        Some(Exp::Node(Node::new(Arc::clone(self), exps)))
    }

    // ------------------------------------------------------------------
    // Left-recursive driver
    // ------------------------------------------------------------------

    /// The synthetic kind for everything after the first shape position.
    fn tail_kind(&self) -> &Arc<NodeKind> {
        self.tail_kind.get_or_init(|| {
            let tail = self.shape.exprs().get(1..).unwrap_or(&[]).to_vec();
            Arc::new(NodeKind::new("(tail)", Shape::from_exprs(tail)))
        })
    }

    fn parse_left_recursive(self: &Arc<Self>, scanner: &mut Scanner) -> Option<Exp> {
        let first = self.shape.exprs().first()?;
        let start_cursor = scanner.cursor();
        let mut left = first.parse(scanner)?;

        if let Some(delimiter) = first.right_delimiter() {
            while scanner.taste(delimiter).is_some() {
                let before = scanner.cursor();
                match self.tail_kind().parse(scanner) {
                    Some(tail) => {
                        let mut children = std::mem::take(&mut left);
                        match tail {
                            Exp::Node(node) if Arc::ptr_eq(node.kind(), self.tail_kind()) => {
                                children.extend(node.into_exps());
                            }
                            other => children.push(other),
                        }
                        left = vec![Exp::Node(Node::new(Arc::clone(self), children))];
                        if scanner.cursor() == before {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }

        match left.into_iter().rev().find(Exp::is_content) {
            Some(exp) => Some(exp),
            None => {
                scanner.set_cursor(start_cursor);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Indentation-block driver
    // ------------------------------------------------------------------

    /// The last non-whitespace character before the cursor, eaten as a
    /// single-character token (for its line and indent) with the cursor
    /// restored afterwards.
    fn controlling_token(scanner: &mut Scanner) -> Option<Token> {
        let entry = scanner.cursor().min(scanner.len());
        let control_pos = scanner
            .text()
            .get(..entry)?
            .char_indices()
            .rev()
            .find(|&(_, c)| c != ' ' && c != '\n')
            .map(|(pos, _)| pos)?;

        scanner.push_cursor();
        scanner.set_cursor(control_pos);
        let token = scanner.eat(&ANY_CHAR);
        scanner.pop_cursor();
        token
    }

    fn parse_indent_block(self: &Arc<Self>, scanner: &mut Scanner) -> Option<Exp> {
        let control = Self::controlling_token(scanner)?;
        let next = scanner.next_content_pos()?;

        if scanner.line_at(next) == control.line {
            // Inline: a single child on the controlling token's line.
            let child = self.parse_standard(scanner)?;
            return Some(self.wrap(child));
        }

        // Block: children must sit deeper than the controlling indent.
        if scanner.line_indent(scanner.line_at(next)).unwrap_or(0) <= control.indent {
            return None;
        }

        let start_cursor = scanner.cursor();
        let mut children: Vec<Exp> = Vec::new();
        loop {
            let Some(pos) = scanner.next_content_pos() else {
                break;
            };
            if scanner.line_indent(scanner.line_at(pos)).unwrap_or(0) <= control.indent {
                break;
            }
            let before = scanner.cursor();
            match self.parse_standard(scanner) {
                Some(Exp::Node(node)) if Arc::ptr_eq(node.kind(), self) => {
                    children.extend(node.into_exps());
                }
                Some(other) => children.push(other),
                None => break,
            }
            if scanner.cursor() == before {
                break;
            }
        }

        if children.is_empty() {
            scanner.set_cursor(start_cursor);
            None
        } else {
            Some(Exp::Node(Node::new(Arc::clone(self), children)))
        }
    }

    fn wrap(self: &Arc<Self>, child: Exp) -> Exp {
        match child {
            Exp::Node(ref node) if Arc::ptr_eq(node.kind(), self) => child,
            other => Exp::Node(Node::new(Arc::clone(self), vec![other])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::shape::{choice, kind, lazy, lit, pat};

    fn kind_of(name: &str, shape: Shape) -> Arc<NodeKind> {
        Arc::new(NodeKind::new(name, shape))
    }

    #[test]
    fn test_standard_driver_builds_node() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let mut scanner = Scanner::new("42");
        let exp = number.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.name(), "number");
        assert_eq!(node.text(), "42");
        assert_eq!(scanner.cursor(), 2);
    }

    #[test]
    fn test_standard_driver_failure_restores_cursor() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let mut scanner = Scanner::new("  abc");
        assert!(number.parse(&mut scanner).is_none());
        assert_eq!(scanner.cursor(), 0);
    }

    #[test]
    fn test_fallback_returns_first_sub_node() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = kind_of("sum", Shape::of([kind(&number), lit("+"), kind(&number)]));
        let mut scanner = Scanner::new("7 *");
        let exp = sum.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.name(), "number");
        assert_eq!(node.text(), "7");
        assert_eq!(scanner.cursor(), 1);
    }

    #[test]
    fn test_without_fallback_fails_cleanly() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new("sum", Shape::of([kind(&number), lit("+"), kind(&number)]))
                .without_fallback(),
        );
        let mut scanner = Scanner::new("7 *");
        assert!(sum.parse(&mut scanner).is_none());
        assert_eq!(scanner.cursor(), 0);
    }

    #[test]
    fn test_incomplete_parse_inserts_missing_sentinel() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new(
                "sum",
                Shape::of([
                    kind(&number),
                    lit("+"),
                    kind(&number).expected("right operand"),
                ]),
            )
            .allow_incomplete(2),
        );
        let mut scanner = Scanner::new("1 +");
        let exp = sum.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.name(), "sum");
        let last = node.exps().last().unwrap().as_token().unwrap();
        assert!(last.missing);
        assert_eq!(last.start, 3);
        assert_eq!(last.expected.as_deref(), Some("right operand"));
    }

    #[test]
    fn test_incomplete_parse_respects_threshold() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new(
                "sum",
                Shape::of([kind(&number), lit("+"), kind(&number)]),
            )
            .allow_incomplete(2)
            .without_fallback(),
        );
        // only one content child accumulated when "+" fails: below the
        // threshold, so the parse fails instead of going partial
        let mut scanner = Scanner::new("1 *");
        assert!(sum.parse(&mut scanner).is_none());
        assert_eq!(scanner.cursor(), 0);
    }

    #[test]
    fn test_left_recursive_folds_left() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new("sum", Shape::of([kind(&number), lit("+"), kind(&number)]))
                .left_recursive(),
        );
        let mut scanner = Scanner::new("1+2+3");
        let exp = sum.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.name(), "sum");
        let values: Vec<&str> = node
            .content_tokens()
            .iter()
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(values, vec!["1", "+", "2", "+", "3"]);

        // left association: the first child of the outer sum is the inner sum
        let inner = node.content_exps()[0].as_node().unwrap();
        assert_eq!(inner.name(), "sum");
        assert_eq!(inner.text(), "1+2");
    }

    #[test]
    fn test_left_recursive_single_operand_returns_operand() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new("sum", Shape::of([kind(&number), lit("+"), kind(&number)]))
                .left_recursive(),
        );
        let mut scanner = Scanner::new("9");
        let exp = sum.parse(&mut scanner).unwrap();
        assert_eq!(exp.as_node().unwrap().name(), "number");
        assert_eq!(scanner.cursor(), 1);
    }

    #[test]
    fn test_left_recursive_trailing_delimiter_keeps_last_good() {
        let number = kind_of("number", Shape::of([pat(r"\d+")]));
        let sum = Arc::new(
            NodeKind::new("sum", Shape::of([kind(&number), lit("+"), kind(&number)]))
                .left_recursive(),
        );
        let mut scanner = Scanner::new("1+2+");
        let exp = sum.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.text(), "1+2");
        assert_eq!(scanner.cursor(), 3);
    }

    #[test]
    fn test_indent_block_inline_child() {
        let body = Arc::new(
            NodeKind::new("body", Shape::of([pat(r"[a-z]+")])).indent_block(),
        );
        let mut scanner = Scanner::new("if: go");
        scanner.eat(&Terminal::Literal("if:".to_string())).unwrap();
        let exp = body.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        assert_eq!(node.name(), "body");
        assert_eq!(node.content_tokens()[0].value, "go");
        assert_eq!(scanner.cursor(), 6);
    }

    #[test]
    fn test_indent_block_collects_deeper_lines() {
        let body = Arc::new(
            NodeKind::new("body", Shape::of([pat(r"[a-z]+")])).indent_block(),
        );
        let mut scanner = Scanner::new("if:\n  aa\n  bb\ncc");
        scanner.eat(&Terminal::Literal("if:".to_string())).unwrap();
        let exp = body.parse(&mut scanner).unwrap();
        let node = exp.as_node().unwrap();
        let values: Vec<&str> = node
            .content_tokens()
            .iter()
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(values, vec!["aa", "bb"]);
        // the dedented line is left for the caller
        assert_eq!(scanner.cursor(), 13);
    }

    #[test]
    fn test_indent_block_rejects_shallow_content() {
        let body = Arc::new(
            NodeKind::new("body", Shape::of([pat(r"[a-z]+")])).indent_block(),
        );
        let mut scanner = Scanner::new("if:\nxx");
        scanner.eat(&Terminal::Literal("if:".to_string())).unwrap();
        assert!(body.parse(&mut scanner).is_none());
        assert_eq!(scanner.cursor(), 3);
    }

    #[test]
    fn test_indent_block_without_controlling_token_fails() {
        let body = Arc::new(
            NodeKind::new("body", Shape::of([pat(r"[a-z]+")])).indent_block(),
        );
        let mut scanner = Scanner::new("  \n  xx");
        assert!(body.parse(&mut scanner).is_none());
        assert_eq!(scanner.cursor(), 0);
    }

    #[test]
    fn test_forward_reference_through_lazy() {
        use once_cell::sync::Lazy as LazyCell;
        static GROUP: LazyCell<Arc<NodeKind>> = LazyCell::new(|| {
            Arc::new(NodeKind::new(
                "paren",
                Shape::of([lit("("), lazy(|| kind(&EXPR)), lit(")")]),
            ))
        });
        static NUMBER: LazyCell<Arc<NodeKind>> = LazyCell::new(|| {
            Arc::new(NodeKind::new("num", Shape::of([pat(r"\d+")])))
        });
        static EXPR: LazyCell<Arc<NodeKind>> = LazyCell::new(|| {
            Arc::new(NodeKind::new(
                "expr",
                Shape::of([choice([kind(&GROUP), kind(&NUMBER)])]),
            ))
        });

        let mut scanner = Scanner::new("((7))");
        let exp = EXPR.parse(&mut scanner).unwrap();
        assert_eq!(exp.text(), "((7))");
        assert!(scanner.at_end());
    }
}
