//! Mutable AST for the stcss dialect.
//!
//! The tree mirrors the shape any block-structured CSS parser produces:
//! rules, at-rules, and declarations, each carrying a [`NodeId`] and a
//! byte-offset span. The analyze pass reads the tree; the transform pass
//! clones it (ids are preserved by the clone) and rewrites the copy.

use std::fmt;

use crate::base::{NodeId, Span};

/// Root of one parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub nodes: Vec<Node>,
    /// Recoverable parse problems; surfaced as diagnostics by the facade.
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Declaration),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Rule(r) => r.id,
            Node::AtRule(a) => a.id,
            Node::Decl(d) => d.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Rule(r) => r.span,
            Node::AtRule(a) => a.span,
            Node::Decl(d) => d.span,
        }
    }
}

/// `selector { ...body }`
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: NodeId,
    pub span: Span,
    pub selector: String,
    pub nodes: Vec<Node>,
}

/// `@name prelude;` or `@name prelude { ...body }`
///
/// `body` is `None` for the statement form (no block at all), which is
/// distinct from an empty block.
#[derive(Debug, Clone)]
pub struct AtRule {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub prelude: String,
    pub body: Option<Vec<Node>>,
}

/// `prop: value` with an optional `!important` flag.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: NodeId,
    pub span: Span,
    pub prop: String,
    pub value: String,
    pub important: bool,
}

/// A recoverable syntax problem; the parser skips past it.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

// ============================================================================
// PRINTING
// ============================================================================

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write_node(f, node, 0)?;
        }
        Ok(())
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    let pad = "    ".repeat(depth);
    match node {
        Node::Rule(rule) => {
            writeln!(f, "{pad}{} {{", rule.selector)?;
            for child in &rule.nodes {
                write_node(f, child, depth + 1)?;
            }
            writeln!(f, "{pad}}}")
        }
        Node::AtRule(at) => {
            let head = if at.prelude.is_empty() {
                format!("@{}", at.name)
            } else {
                format!("@{} {}", at.name, at.prelude)
            };
            match &at.body {
                None => writeln!(f, "{pad}{head};"),
                Some(body) => {
                    writeln!(f, "{pad}{head} {{")?;
                    for child in body {
                        write_node(f, child, depth + 1)?;
                    }
                    writeln!(f, "{pad}}}")
                }
            }
        }
        Node::Decl(decl) => {
            let bang = if decl.important { " !important" } else { "" };
            writeln!(f, "{pad}{}: {}{bang};", decl.prop, decl.value)
        }
    }
}

impl Rule {
    /// Iterate the rule's direct declarations.
    pub fn decls(&self) -> impl Iterator<Item = &Declaration> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Decl(d) => Some(d),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::empty_span;

    fn decl(prop: &str, value: &str) -> Node {
        Node::Decl(Declaration {
            id: NodeId(1),
            span: empty_span(),
            prop: prop.into(),
            value: value.into(),
            important: false,
        })
    }

    #[test]
    fn prints_nested_structure() {
        let root = Root {
            nodes: vec![Node::AtRule(AtRule {
                id: NodeId(0),
                span: empty_span(),
                name: "media".into(),
                prelude: "screen".into(),
                body: Some(vec![Node::Rule(Rule {
                    id: NodeId(2),
                    span: empty_span(),
                    selector: ".a".into(),
                    nodes: vec![decl("color", "red")],
                })]),
            })],
            errors: vec![],
        };
        assert_eq!(
            root.to_string(),
            "@media screen {\n    .a {\n        color: red;\n    }\n}\n"
        );
    }

    #[test]
    fn prints_statement_at_rule() {
        let root = Root {
            nodes: vec![Node::AtRule(AtRule {
                id: NodeId(0),
                span: empty_span(),
                name: "layer".into(),
                prelude: "a, b".into(),
                body: None,
            })],
            errors: vec![],
        };
        assert_eq!(root.to_string(), "@layer a, b;\n");
    }
}
