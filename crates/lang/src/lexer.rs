//! Tokenizer for the alpha expression DSL
//!
//! Numbers keep their raw spelling so the code generator can normalize
//! them itself; every token carries its 1-based line and column for parse
//! errors.

use alpha_core::{Error, Result};

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal, raw source text.
    Number(String),
    /// Identifier.
    Name(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// End of input.
    Eof,
}

/// A token plus its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// Scan a source string into tokens (trailing Eof included).
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;

    macro_rules! push {
        ($kind:expr, $len:expr) => {{
            tokens.push(Token {
                kind: $kind,
                line,
                column,
            });
            i += $len;
            column += $len;
        }};
    }

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\n' => {
                i += 1;
                line += 1;
                column = 1;
            }
            ' ' | '\t' | '\r' => {
                i += 1;
                column += 1;
            }
            '+' => push!(TokenKind::Plus, 1),
            '-' => push!(TokenKind::Minus, 1),
            '*' => push!(TokenKind::Star, 1),
            '/' => push!(TokenKind::Slash, 1),
            '^' => push!(TokenKind::Caret, 1),
            '?' => push!(TokenKind::Question, 1),
            ':' => push!(TokenKind::Colon, 1),
            '(' => push!(TokenKind::LParen, 1),
            ')' => push!(TokenKind::RParen, 1),
            ',' => push!(TokenKind::Comma, 1),
            '=' if next == Some('=') => push!(TokenKind::EqEq, 2),
            '!' if next == Some('=') => push!(TokenKind::NotEq, 2),
            '<' if next == Some('=') => push!(TokenKind::LtEq, 2),
            '>' if next == Some('=') => push!(TokenKind::GtEq, 2),
            '<' => push!(TokenKind::Lt, 1),
            '>' => push!(TokenKind::Gt, 1),
            '&' if next == Some('&') => push!(TokenKind::AndAnd, 2),
            '|' if next == Some('|') => push!(TokenKind::OrOr, 2),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => push!(TokenKind::Dot, 1),
            _ if c.is_ascii_digit() || c == '.' => {
                let len = scan_number(&chars[i..]);
                let text: String = chars[i..i + len].iter().collect();
                push!(TokenKind::Number(text), len);
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut len = 1;
                while i + len < chars.len()
                    && (chars[i + len].is_ascii_alphanumeric() || chars[i + len] == '_')
                {
                    len += 1;
                }
                let text: String = chars[i..i + len].iter().collect();
                push!(TokenKind::Name(text), len);
            }
            _ => {
                return Err(Error::parse(
                    line,
                    column,
                    format!("unexpected character `{c}`"),
                ));
            }
        }
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        column,
    });
    Ok(tokens)
}

/// Length of a numeric literal: digits, optional fraction (possibly bare
/// like `2.`), optional exponent.
fn scan_number(chars: &[char]) -> usize {
    let mut len = 0;
    while len < chars.len() && chars[len].is_ascii_digit() {
        len += 1;
    }
    if len < chars.len() && chars[len] == '.' {
        len += 1;
        while len < chars.len() && chars[len].is_ascii_digit() {
            len += 1;
        }
    }
    if len < chars.len() && (chars[len] == 'e' || chars[len] == 'E') {
        let mut exp = len + 1;
        if exp < chars.len() && (chars[exp] == '+' || chars[exp] == '-') {
            exp += 1;
        }
        if exp < chars.len() && chars[exp].is_ascii_digit() {
            len = exp;
            while len < chars.len() && chars[len].is_ascii_digit() {
                len += 1;
            }
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_operators() {
        assert_eq!(
            kinds("a<=b && c||d"),
            vec![
                TokenKind::Name("a".into()),
                TokenKind::LtEq,
                TokenKind::Name("b".into()),
                TokenKind::AndAnd,
                TokenKind::Name("c".into()),
                TokenKind::OrOr,
                TokenKind::Name("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_number_spellings() {
        assert_eq!(
            kinds("2. .5 1e-3 42"),
            vec![
                TokenKind::Number("2.".into()),
                TokenKind::Number(".5".into()),
                TokenKind::Number("1e-3".into()),
                TokenKind::Number("42".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dot_between_names_is_a_dot() {
        assert_eq!(
            kinds("a.b"),
            vec![
                TokenKind::Name("a".into()),
                TokenKind::Dot,
                TokenKind::Name("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_positions() {
        let toks = tokenize("a\n  b").unwrap();
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
    }

    #[test]
    fn rejects_stray_characters() {
        let err = tokenize("a # b").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.position(), Some((1, 3)));
        assert!(tokenize("a & b").unwrap_err().is_parse());
    }
}
