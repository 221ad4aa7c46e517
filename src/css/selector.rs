//! Selector tokenizer.
//!
//! Parses selector text into structured nodes for scoping. Parsing is
//! tolerant: anything unrecognized becomes a [`SelectorNode::Raw`] chunk
//! that serializes back verbatim.

use std::fmt;

use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorNode {
    Universal,
    /// `&` nesting selector.
    Nesting,
    Type(SmolStr),
    Class(SmolStr),
    Id(SmolStr),
    /// Raw attribute selector content, without the brackets.
    Attr(String),
    PseudoClass {
        name: SmolStr,
        /// Raw argument text, without the parens.
        arg: Option<String>,
    },
    PseudoElement(SmolStr),
    /// `' '`, `'>'`, `'+'`, `'~'`
    Combinator(char),
    Raw(String),
}

/// One complex selector (a compound chain joined by combinators).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub nodes: Vec<SelectorNode>,
}

/// A comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse selector text into a list of complex selectors.
pub fn parse_selector_list(input: &str) -> SelectorList {
    let selectors = split_top_level_commas(input)
        .into_iter()
        .map(|part| parse_selector(part.trim()))
        .filter(|sel| !sel.nodes.is_empty())
        .collect();
    SelectorList { selectors }
}

/// Split selector text on commas outside parens/brackets, honoring
/// escapes.
pub fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut chars = input.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_selector(input: &str) -> Selector {
    let mut nodes = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(idx, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
                    chars.next();
                }
                // descendant combinator unless a sigil combinator follows
                match chars.peek() {
                    None => {}
                    Some(&(_, '>' | '+' | '~')) => {}
                    Some(_) if nodes.is_empty() => {}
                    Some(_) => nodes.push(SelectorNode::Combinator(' ')),
                }
            }
            '>' | '+' | '~' => {
                chars.next();
                while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
                    chars.next();
                }
                nodes.push(SelectorNode::Combinator(c));
            }
            '*' => {
                chars.next();
                nodes.push(SelectorNode::Universal);
            }
            '&' => {
                chars.next();
                nodes.push(SelectorNode::Nesting);
            }
            '.' => {
                chars.next();
                nodes.push(SelectorNode::Class(read_ident(input, &mut chars)));
            }
            '#' => {
                chars.next();
                nodes.push(SelectorNode::Id(read_ident(input, &mut chars)));
            }
            ':' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, c)| c == ':') {
                    chars.next();
                    nodes.push(SelectorNode::PseudoElement(read_ident(input, &mut chars)));
                } else {
                    let name = read_ident(input, &mut chars);
                    let arg = if chars.peek().is_some_and(|&(_, c)| c == '(') {
                        Some(read_balanced(input, &mut chars))
                    } else {
                        None
                    };
                    nodes.push(SelectorNode::PseudoClass { name, arg });
                }
            }
            '[' => {
                chars.next();
                let mut content = String::new();
                let mut depth = 1;
                for (_, c) in chars.by_ref() {
                    match c {
                        '[' => depth += 1,
                        ']' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    content.push(c);
                }
                nodes.push(SelectorNode::Attr(content));
            }
            c if is_ident_start(c) => {
                nodes.push(SelectorNode::Type(read_ident(input, &mut chars)));
            }
            _ => {
                chars.next();
                nodes.push(SelectorNode::Raw(input[idx..idx + c.len_utf8()].to_string()));
            }
        }
    }
    Selector { nodes }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '\\'
}

fn read_ident(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> SmolStr {
    let start = chars.peek().map(|&(idx, _)| idx).unwrap_or(input.len());
    let mut end = start;
    while let Some(&(idx, c)) = chars.peek() {
        if c == '\\' {
            chars.next();
            if let Some((eidx, ec)) = chars.next() {
                end = eidx + ec.len_utf8();
            } else {
                end = idx + 1;
            }
        } else if c.is_alphanumeric() || c == '_' || c == '-' {
            chars.next();
            end = idx + c.len_utf8();
        } else {
            break;
        }
    }
    SmolStr::new(&input[start..end])
}

/// Read a balanced `(...)` group, returning the inner text.
fn read_balanced(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> String {
    chars.next(); // `(`
    let start = chars.peek().map(|&(idx, _)| idx).unwrap_or(input.len());
    let mut end = start;
    let mut depth = 1;
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    end = idx;
                    break;
                }
            }
            _ => {}
        }
    }
    input[start..end].to_string()
}

// ============================================================================
// SERIALIZATION
// ============================================================================

impl fmt::Display for SelectorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorNode::Universal => write!(f, "*"),
            SelectorNode::Nesting => write!(f, "&"),
            SelectorNode::Type(name) => write!(f, "{name}"),
            SelectorNode::Class(name) => write!(f, ".{name}"),
            SelectorNode::Id(name) => write!(f, "#{name}"),
            SelectorNode::Attr(content) => write!(f, "[{content}]"),
            SelectorNode::PseudoClass { name, arg: None } => write!(f, ":{name}"),
            SelectorNode::PseudoClass {
                name,
                arg: Some(arg),
            } => write!(f, ":{name}({arg})"),
            SelectorNode::PseudoElement(name) => write!(f, "::{name}"),
            SelectorNode::Combinator(' ') => write!(f, " "),
            SelectorNode::Combinator(c) => write!(f, " {c} "),
            SelectorNode::Raw(text) => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for sel in &self.selectors {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{sel}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_selector() {
        let list = parse_selector_list(".a.b:hover");
        assert_eq!(list.selectors.len(), 1);
        assert_eq!(
            list.selectors[0].nodes,
            vec![
                SelectorNode::Class("a".into()),
                SelectorNode::Class("b".into()),
                SelectorNode::PseudoClass {
                    name: "hover".into(),
                    arg: None
                },
            ]
        );
    }

    #[test]
    fn parses_combinators_and_list() {
        let list = parse_selector_list(".a > .b, .c .d");
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(list.to_string(), ".a > .b, .c .d");
    }

    #[test]
    fn parses_functional_pseudo() {
        let list = parse_selector_list(":not(.a, .b)");
        assert_eq!(
            list.selectors[0].nodes,
            vec![SelectorNode::PseudoClass {
                name: "not".into(),
                arg: Some(".a, .b".into())
            }]
        );
    }

    #[test]
    fn comma_inside_pseudo_does_not_split_list() {
        let list = parse_selector_list(":is(.a, .b) .c");
        assert_eq!(list.selectors.len(), 1);
    }

    #[test]
    fn round_trips_attribute_and_type() {
        let list = parse_selector_list("Button[disabled] .x");
        assert_eq!(list.to_string(), "Button[disabled] .x");
    }

    #[test]
    fn parses_nesting_selector() {
        let list = parse_selector_list("&:hover");
        assert_eq!(list.selectors[0].nodes[0], SelectorNode::Nesting);
    }
}
