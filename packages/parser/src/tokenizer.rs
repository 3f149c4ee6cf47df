use crate::error::{ParseError, ParseResult};
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Token types for the text format
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'src> {
    // Field names, enum values, true/false, inf/nan
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    // String literals, quotes included (unescaped by the parser)
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| lex.slice())]
    String(&'src str),

    // Integers and floats, with optional sign and `f` suffix
    #[regex(r"-?[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?[fF]?", |lex| lex.slice())]
    #[regex(r"-?\.[0-9]+([eE][+-]?[0-9]+)?[fF]?", |lex| lex.slice())]
    #[regex(r"-?0[xX][0-9a-fA-F]+", |lex| lex.slice())]
    Number(&'src str),

    // Symbols
    #[token(":")]
    Colon,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("-")]
    Minus,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::String(s) => write!(f, "string {}", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Colon => write!(f, ":"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Minus => write!(f, "-"),
        }
    }
}

/// Tokenize source text, keeping the byte span of every token
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Range<usize>)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(ParseError::lexer_error(lexer.span().start)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_field_with_scalar() {
        assert_eq!(
            kinds("width: 512"),
            vec![Token::Ident("width"), Token::Colon, Token::Number("512")]
        );
    }

    #[test]
    fn test_comments_and_whitespace_skipped() {
        let tokens = kinds("# header\nname: \"x\" # trailing\n");
        assert_eq!(
            tokens,
            vec![Token::Ident("name"), Token::Colon, Token::String("\"x\"")]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            kinds("-1 2.5 1e10 .5 3f 0x1F"),
            vec![
                Token::Number("-1"),
                Token::Number("2.5"),
                Token::Number("1e10"),
                Token::Number(".5"),
                Token::Number("3f"),
                Token::Number("0x1F"),
            ]
        );
    }

    #[test]
    fn test_negative_infinity_is_minus_then_ident() {
        assert_eq!(kinds("-inf"), vec![Token::Minus, Token::Ident("inf")]);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::String(r#""a\"b""#)]);
    }

    #[test]
    fn test_lexer_error_position() {
        let err = tokenize("name: @").unwrap_err();
        assert_eq!(err, ParseError::LexerError { pos: 6 });
    }
}
