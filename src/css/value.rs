//! Value-expression tokenizer.
//!
//! Breaks declaration values and at-rule preludes into idents, functions,
//! strings, and operators. Escaped characters (`\.`, `\,`) are part of an
//! identifier, not syntax.

use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// A bare word: identifiers, numbers, dimensions. Escapes preserved raw.
    Ident(SmolStr),
    /// A quoted string including its quotes.
    QuotedString(String),
    /// `name(args)`
    Func { name: SmolStr, args: Vec<ValueNode> },
    /// A bare parenthesized group, e.g. a container query condition.
    Paren(Vec<ValueNode>),
    /// A bracketed group, e.g. the named block of `@st-import`.
    Bracket(Vec<ValueNode>),
    Comma,
    Slash,
    /// Other single-char operators (`<`, `>`, `=`).
    Op(char),
    /// A run of whitespace, collapsed.
    Space,
}

impl ValueNode {
    pub fn as_ident(&self) -> Option<&SmolStr> {
        match self {
            ValueNode::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_space(&self) -> bool {
        matches!(self, ValueNode::Space)
    }
}

const IDENT_TERMINATORS: &[char] = &['(', ')', '[', ']', ',', '/', '"', '\'', '<', '>', '='];

/// Tokenize a raw value string.
pub fn tokenize_value(input: &str) -> Vec<ValueNode> {
    let mut chars = input.char_indices().peekable();
    tokenize_group(input, &mut chars, None)
}

fn tokenize_group(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    close: Option<char>,
) -> Vec<ValueNode> {
    let mut nodes = Vec::new();
    while let Some(&(idx, c)) = chars.peek() {
        if Some(c) == close {
            chars.next();
            break;
        }
        match c {
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
                    chars.next();
                }
                nodes.push(ValueNode::Space);
            }
            ',' => {
                chars.next();
                nodes.push(ValueNode::Comma);
            }
            '/' => {
                chars.next();
                nodes.push(ValueNode::Slash);
            }
            '<' | '>' | '=' => {
                chars.next();
                nodes.push(ValueNode::Op(c));
            }
            '(' => {
                chars.next();
                nodes.push(ValueNode::Paren(tokenize_group(input, chars, Some(')'))));
            }
            '[' => {
                chars.next();
                nodes.push(ValueNode::Bracket(tokenize_group(input, chars, Some(']'))));
            }
            ')' | ']' => {
                // unbalanced closer; keep it visible rather than losing text
                chars.next();
                nodes.push(ValueNode::Op(c));
            }
            '"' | '\'' => {
                nodes.push(read_string(input, chars, c));
            }
            _ => {
                let ident = read_ident(input, chars, idx);
                if chars.peek().is_some_and(|&(_, c)| c == '(') {
                    chars.next();
                    let args = tokenize_group(input, chars, Some(')'));
                    nodes.push(ValueNode::Func { name: ident, args });
                } else {
                    nodes.push(ValueNode::Ident(ident));
                }
            }
        }
    }
    nodes
}

fn read_string(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> ValueNode {
    let (start, _) = chars.next().expect("string start");
    let mut end = input.len();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            end = idx + c.len_utf8();
            break;
        }
    }
    ValueNode::QuotedString(input[start..end].to_string())
}

fn read_ident(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> SmolStr {
    let mut end = start;
    while let Some(&(idx, c)) = chars.peek() {
        if c == '\\' {
            chars.next();
            if let Some((eidx, ec)) = chars.next() {
                end = eidx + ec.len_utf8();
            } else {
                end = idx + 1;
            }
        } else if c.is_whitespace() || IDENT_TERMINATORS.contains(&c) {
            break;
        } else {
            chars.next();
            end = idx + c.len_utf8();
        }
    }
    SmolStr::new(&input[start..end])
}

/// Serialize nodes back to text.
pub fn serialize_value(nodes: &[ValueNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            ValueNode::Ident(name) => out.push_str(name),
            ValueNode::QuotedString(raw) => out.push_str(raw),
            ValueNode::Func { name, args } => {
                out.push_str(name);
                out.push('(');
                out.push_str(&serialize_value(args));
                out.push(')');
            }
            ValueNode::Paren(args) => {
                out.push('(');
                out.push_str(&serialize_value(args));
                out.push(')');
            }
            ValueNode::Bracket(args) => {
                out.push('[');
                out.push_str(&serialize_value(args));
                out.push(']');
            }
            ValueNode::Comma => out.push(','),
            ValueNode::Slash => out.push('/'),
            ValueNode::Op(c) => out.push(*c),
            ValueNode::Space => out.push(' '),
        }
    }
    out
}

/// Split a node list on top-level commas; surrounding spaces are trimmed
/// from each segment and empty segments dropped.
pub fn split_commas(nodes: &[ValueNode]) -> Vec<Vec<ValueNode>> {
    let mut segments = vec![Vec::new()];
    for node in nodes {
        if matches!(node, ValueNode::Comma) {
            segments.push(Vec::new());
        } else {
            segments.last_mut().expect("segment").push(node.clone());
        }
    }
    segments
        .into_iter()
        .map(trim_spaces)
        .filter(|seg| !seg.is_empty())
        .collect()
}

/// Trim leading/trailing space nodes from a segment.
pub fn trim_spaces(mut nodes: Vec<ValueNode>) -> Vec<ValueNode> {
    while nodes.first().is_some_and(ValueNode::is_space) {
        nodes.remove(0);
    }
    while nodes.last().is_some_and(ValueNode::is_space) {
        nodes.pop();
    }
    nodes
}

/// If the node is `st-global(<ident>)`, return the wrapped identifier.
pub fn as_st_global(node: &ValueNode) -> Option<SmolStr> {
    match node {
        ValueNode::Func { name, args } if name == "st-global" => {
            let inner = trim_spaces(args.clone());
            match inner.as_slice() {
                [ValueNode::Ident(ident)] => Some(ident.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Remove escape backslashes, keeping the escaped characters.
pub fn unescape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a (possibly escaped) dotted name into segments: `a.b` -> [a, b],
/// while `a\.b` stays one segment.
pub fn split_dotted(name: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let segment = segments.last_mut().expect("segment");
                segment.push('\\');
                if let Some(escaped) = chars.next() {
                    segment.push(escaped);
                }
            }
            '.' => segments.push(String::new()),
            _ => segments.last_mut().expect("segment").push(c),
        }
    }
    segments.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_container_prelude() {
        let text = "con (inline-size>100px)";
        assert_eq!(serialize_value(&tokenize_value(text)), text);
    }

    #[test]
    fn parses_functions_and_commas() {
        let nodes = tokenize_value("mix(a, b), other");
        let segments = split_commas(&nodes);
        assert_eq!(segments.len(), 2);
        match &segments[0][0] {
            ValueNode::Func { name, args } => {
                assert_eq!(name, "mix");
                assert_eq!(split_commas(args).len(), 2);
            }
            other => panic!("expected func, got {other:?}"),
        }
    }

    #[test]
    fn escaped_comma_is_part_of_ident() {
        let nodes = tokenize_value(r"a\,b");
        assert_eq!(nodes, vec![ValueNode::Ident(r"a\,b".into())]);
        assert_eq!(unescape(r"a\,b"), "a,b");
    }

    #[test]
    fn detects_st_global() {
        let nodes = tokenize_value("st-global(foo)");
        assert_eq!(as_st_global(&nodes[0]).as_deref(), Some("foo"));
        let not = tokenize_value("other(foo)");
        assert_eq!(as_st_global(&not[0]), None);
    }

    #[test]
    fn splits_dotted_names_honoring_escapes() {
        assert_eq!(split_dotted("a.b"), vec!["a", "b"]);
        assert_eq!(split_dotted(r"a\.b"), vec![r"a\.b"]);
    }

    #[test]
    fn bracket_groups_nest() {
        let nodes = tokenize_value("Def, [a, b as c] from \"./f\"");
        assert!(nodes.iter().any(|n| matches!(n, ValueNode::Bracket(_))));
        assert!(
            nodes
                .iter()
                .any(|n| matches!(n, ValueNode::QuotedString(s) if s == "\"./f\""))
        );
    }
}
