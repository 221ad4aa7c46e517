//! Hand-written block parser over the token stream.
//!
//! The parser is error-tolerant: malformed input produces a
//! [`ParseError`] on the root and skips to the next safe point, so a
//! file with problems still yields a usable tree (the rest of the
//! pipeline reports best-effort results).

use text_size::{TextRange, TextSize};

use crate::base::NodeId;
use crate::css::ast::{AtRule, Declaration, Node, ParseError, Root, Rule};
use crate::css::lexer::{Token, TokenKind, tokenize};

/// Parse a source string into a [`Root`] tree.
pub fn parse(src: &str) -> Root {
    let mut parser = Parser::new(src);
    let nodes = parser.parse_nodes(true);
    Root {
        nodes,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            tokens: tokenize(src),
            pos: 0,
            next_id: 0,
            errors: Vec::new(),
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn skip_trivia(&mut self) {
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Whitespace | TokenKind::Comment => self.pos += 1,
                _ => break,
            }
        }
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        if from >= to {
            return "";
        }
        let start = self.tokens[from].range.start();
        let end = self.tokens[to - 1].range.end();
        &self.src[TextRange::new(start, end)]
    }

    fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.errors.push(ParseError {
            message: message.into(),
            span: range,
        });
    }

    fn end_offset(&self) -> TextSize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.range.end())
            .unwrap_or_else(|| TextSize::new(self.src.len() as u32))
    }

    fn parse_nodes(&mut self, top_level: bool) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            self.skip_trivia();
            let Some(tok) = self.peek() else { break };
            match tok.kind {
                TokenKind::RBrace => {
                    if top_level {
                        self.error("unexpected '}'", tok.range);
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                TokenKind::Semicolon => {
                    // stray semicolon
                    self.pos += 1;
                }
                TokenKind::AtKeyword => {
                    if let Some(node) = self.parse_at_rule() {
                        nodes.push(node);
                    }
                }
                _ => {
                    if let Some(node) = self.parse_rule_or_decl(top_level) {
                        nodes.push(node);
                    }
                }
            }
        }
        nodes
    }

    fn parse_at_rule(&mut self) -> Option<Node> {
        let id = self.fresh_id();
        let at_tok = self.bump()?;
        let name = at_tok.text(self.src)[1..].to_string();
        let start = at_tok.range.start();

        // prelude: everything until a top-level `{`, `;`, `}` or EOF
        let prelude_from = self.pos;
        let mut depth = 0i32;
        let mut body_opens = false;
        loop {
            let Some(tok) = self.peek() else { break };
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                TokenKind::LBrace if depth <= 0 => {
                    body_opens = true;
                    break;
                }
                TokenKind::Semicolon | TokenKind::RBrace if depth <= 0 => break,
                _ => {}
            }
            self.pos += 1;
        }
        let prelude = self.slice(prelude_from, self.pos).trim().to_string();

        let body = if body_opens {
            self.bump(); // `{`
            let children = self.parse_nodes(false);
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RBrace => {
                    self.pos += 1;
                }
                _ => self.error(format!("unclosed block in @{name}"), at_tok.range),
            }
            Some(children)
        } else {
            if matches!(self.peek().map(|t| t.kind), Some(TokenKind::Semicolon)) {
                self.pos += 1;
            }
            None
        };

        let span = TextRange::new(start, self.end_offset());
        Some(Node::AtRule(AtRule {
            id,
            span,
            name,
            prelude,
            body,
        }))
    }

    fn parse_rule_or_decl(&mut self, top_level: bool) -> Option<Node> {
        // Scan ahead for the first top-level `{` (rule) or `;`/`}` (declaration).
        let start_pos = self.pos;
        let mut depth = 0i32;
        let mut scan = self.pos;
        let mut opens_block = false;
        while let Some(tok) = self.tokens.get(scan) {
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                TokenKind::LBrace if depth <= 0 => {
                    opens_block = true;
                    break;
                }
                TokenKind::Semicolon | TokenKind::RBrace if depth <= 0 => break,
                _ => {}
            }
            scan += 1;
        }

        if opens_block {
            let id = self.fresh_id();
            let start = self.tokens[start_pos].range.start();
            let selector = self.slice(start_pos, scan).trim().to_string();
            self.pos = scan + 1; // past `{`
            if selector.is_empty() {
                self.error("rule with empty selector", self.tokens[start_pos].range);
            }
            let nodes = self.parse_nodes(false);
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RBrace => {
                    self.pos += 1;
                }
                _ => self.error("unclosed rule block", self.tokens[start_pos].range),
            }
            let span = TextRange::new(start, self.end_offset());
            return Some(Node::Rule(Rule {
                id,
                span,
                selector,
                nodes,
            }));
        }

        // Declaration run: tokens [start_pos, scan)
        let run_range = TextRange::new(
            self.tokens[start_pos].range.start(),
            self.tokens
                .get(scan.saturating_sub(1))
                .map(|t| t.range.end())
                .unwrap_or_else(|| self.tokens[start_pos].range.end()),
        );
        let result = self.parse_declaration(start_pos, scan, top_level, run_range);
        self.pos = scan;
        if matches!(self.peek().map(|t| t.kind), Some(TokenKind::Semicolon)) {
            self.pos += 1;
        }
        result
    }

    fn parse_declaration(
        &mut self,
        from: usize,
        to: usize,
        top_level: bool,
        run_range: TextRange,
    ) -> Option<Node> {
        if top_level {
            self.error("declaration outside of a block", run_range);
            return None;
        }
        let mut depth = 0i32;
        let mut colon = None;
        for (i, tok) in self.tokens[from..to].iter().enumerate() {
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                TokenKind::Colon if depth <= 0 => {
                    colon = Some(from + i);
                    break;
                }
                _ => {}
            }
        }
        let Some(colon) = colon else {
            self.error("expected ':' in declaration", run_range);
            return None;
        };
        let prop = self.slice(from, colon).trim().to_string();
        if prop.is_empty() {
            self.error("declaration with empty property", run_range);
            return None;
        }
        let raw_value = self.slice(colon + 1, to).trim();
        let (value, important) = strip_important(raw_value);
        let id = self.fresh_id();
        Some(Node::Decl(Declaration {
            id,
            span: run_range,
            prop,
            value: value.to_string(),
            important,
        }))
    }
}

/// Split a trailing `!important` (any case, optional inner whitespace)
/// off a raw declaration value.
fn strip_important(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim_end();
    let lower_len = "important".len();
    if trimmed.len() >= lower_len
        && trimmed[trimmed.len() - lower_len..].eq_ignore_ascii_case("important")
    {
        let before = trimmed[..trimmed.len() - lower_len].trim_end();
        if let Some(stripped) = before.strip_suffix('!') {
            return (stripped.trim_end(), true);
        }
    }
    (trimmed, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_rule(root: &Root) -> &Rule {
        match &root.nodes[0] {
            Node::Rule(r) => r,
            other => panic!("expected rule, got {other:?}"),
        }
    }

    #[test]
    fn parses_rule_with_declarations() {
        let root = parse(".a, .b { color: red; width: 10px }");
        let rule = first_rule(&root);
        assert_eq!(rule.selector, ".a, .b");
        assert_eq!(rule.nodes.len(), 2);
        let decls: Vec<_> = rule.decls().collect();
        assert_eq!(decls[0].prop, "color");
        assert_eq!(decls[0].value, "red");
        assert_eq!(decls[1].prop, "width");
        assert_eq!(decls[1].value, "10px");
    }

    #[test]
    fn parses_statement_and_block_at_rules() {
        let root = parse("@layer base;\n@container con (inline-size > 100px) { .a { color: red } }");
        match (&root.nodes[0], &root.nodes[1]) {
            (Node::AtRule(stmt), Node::AtRule(block)) => {
                assert_eq!(stmt.name, "layer");
                assert_eq!(stmt.prelude, "base");
                assert!(stmt.body.is_none());
                assert_eq!(block.name, "container");
                assert_eq!(block.prelude, "con (inline-size > 100px)");
                assert_eq!(block.body.as_ref().unwrap().len(), 1);
            }
            other => panic!("unexpected nodes {other:?}"),
        }
    }

    #[test]
    fn parses_nested_rules() {
        let root = parse("@media screen { .a { .b { color: red } } }");
        let Node::AtRule(media) = &root.nodes[0] else {
            panic!()
        };
        let Node::Rule(outer) = &media.body.as_ref().unwrap()[0] else {
            panic!()
        };
        assert!(matches!(outer.nodes[0], Node::Rule(_)));
    }

    #[test]
    fn strips_important_flag() {
        let root = parse(".a { color: red !important; }");
        let rule = first_rule(&root);
        let decl = rule.decls().next().unwrap();
        assert_eq!(decl.value, "red");
        assert!(decl.important);
    }

    #[test]
    fn recovers_from_missing_colon() {
        let root = parse(".a { garbage; color: red; }");
        let rule = first_rule(&root);
        assert_eq!(rule.decls().count(), 1);
        assert_eq!(root.errors.len(), 1);
    }

    #[test]
    fn declaration_at_top_level_is_an_error() {
        let root = parse("color: red;");
        assert!(root.nodes.is_empty());
        assert_eq!(root.errors.len(), 1);
    }

    #[test]
    fn pseudo_selector_with_colon_still_parses_as_rule() {
        let root = parse(":import { -st-from: \"./a.st.css\"; }");
        let rule = first_rule(&root);
        assert_eq!(rule.selector, ":import");
        assert_eq!(rule.decls().next().unwrap().prop, "-st-from");
    }

    #[test]
    fn node_ids_are_unique() {
        let root = parse(".a { color: red; } .b { color: blue; }");
        let mut ids = vec![];
        for node in &root.nodes {
            ids.push(node.id());
            if let Node::Rule(r) = node {
                for child in &r.nodes {
                    ids.push(child.id());
                }
            }
        }
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
