//! Logos-based lexer for the stcss dialect.
//!
//! Tokenization is deliberately coarse: only block structure is lexed
//! (braces, semicolons, colons, strings, comments). Selector text and
//! declaration values stay raw slices; the dedicated value/selector
//! tokenizers handle their internals, including escapes.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind and source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn text(self, src: &str) -> &str {
        &src[self.range]
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    Comment,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[regex(r"@[A-Za-z-][A-Za-z0-9_-]*")]
    AtKeyword,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("/")]
    Slash,

    /// Any run of characters that is not structural at block level.
    #[regex(r#"[^ \t\r\n\f{}()\[\];:,'"@/]+"#)]
    Word,

    /// Single-character fallback so the lexer never gets stuck.
    #[regex(r".", priority = 1)]
    Delim,
}

/// Tokenize an entire source string.
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(src);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::new(span.start as u32),
            TextSize::new(span.end as u32),
        );
        let kind = result.unwrap_or(TokenKind::Delim);
        tokens.push(Token { kind, range });
    }
    tokens
}
