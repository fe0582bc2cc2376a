//! Treeviz formatter for parse trees
//!
//! Treeviz is a one-line-per-node visual rendering of a parse tree, handy
//! for eyeballing what a grammar actually matched. Nodes print their kind
//! name, tokens print their value with whitespace made visible.
//!
//! Icons:
//!     Node: ⊙
//!     Token: ◦
//!     Whitespace token: ␣
//!     Missing sentinel: ∅

use crate::grammar::node::{Exp, Node};

/// Render a parse tree, one line per node or token.
pub fn render(exp: &Exp) -> String {
    let mut out = String::new();
    render_exp(exp, 0, &mut out);
    out
}

/// Render a node directly (equivalent to wrapping it in [`render`]).
pub fn render_node(node: &Node) -> String {
    let mut out = String::new();
    render_node_at(node, 0, &mut out);
    out
}

fn render_exp(exp: &Exp, depth: usize, out: &mut String) {
    match exp {
        Exp::Node(node) => render_node_at(node, depth, out),
        Exp::Token(token) => {
            let pad = "  ".repeat(depth);
            if token.missing {
                out.push_str(&format!("{}∅ (missing)\n", pad));
            } else if token.is_whitespace() {
                out.push_str(&format!("{}␣ \"{}\"\n", pad, escape(&token.value)));
            } else {
                out.push_str(&format!("{}◦ \"{}\"\n", pad, escape(&token.value)));
            }
        }
    }
}

fn render_node_at(node: &Node, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    out.push_str(&format!("{}⊙ {}\n", pad, node.name()));
    for child in node.exps() {
        render_exp(child, depth + 1, out);
    }
}

fn escape(value: &str) -> String {
    value.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::grammar::kind::NodeKind;
    use crate::grammar::scanner::Scanner;
    use crate::grammar::shape::{kind, lit, pat, Shape};

    #[test]
    fn test_render_tree() {
        let number = Arc::new(NodeKind::new("number", Shape::of([pat(r"\d+")])));
        let sum = Arc::new(NodeKind::new(
            "sum",
            Shape::of([kind(&number), lit("+"), kind(&number)]),
        ));
        let mut scanner = Scanner::new("2 + 3");
        let exp = sum.parse(&mut scanner).unwrap();
        let rendered = render(&exp);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "⊙ sum");
        assert_eq!(lines[1], "  ⊙ number");
        assert_eq!(lines[2], "    ◦ \"2\"");
        assert!(lines.contains(&"  ␣ \" \""));
        assert!(lines.contains(&"  ◦ \"+\""));
    }

    #[test]
    fn test_render_escapes_newlines() {
        let word = Arc::new(NodeKind::new("word", Shape::of([pat(r"[a-z]+")])));
        let wrapper = Arc::new(NodeKind::new(
            "pair",
            Shape::of([kind(&word), kind(&word)]),
        ));
        let mut scanner = Scanner::new("a\nb");
        let exp = wrapper.parse(&mut scanner).unwrap();
        let rendered = render(&exp);
        assert!(rendered.contains("␣ \"\\n\""));
    }
}
