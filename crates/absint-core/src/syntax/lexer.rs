//! Lexer for the analyzed language using logos
//!
//! Token categories:
//! 1. Keywords: int, if, else, while, assert
//! 2. Operators: arithmetic, comparison, assignment
//! 3. Delimiters: `( ) { } ;`
//! 4. Literals: decimal integers
//! 5. Identifiers
//! 6. Comments: `//` line comments, `/* ... */` block comments

use logos::Logos;

use crate::span::Span;

/// Callback to lex block comments `/* ... */`
/// Consumes up to and including the closing `*/`
fn lex_block_comment(lexer: &mut logos::Lexer<Token>) -> bool {
    let remainder = lexer.remainder();
    let bytes = remainder.as_bytes();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            lexer.bump(i + 2);
            return true;
        }
        i += 1;
    }

    // Unclosed comment
    false
}

/// Tokens of the analyzed language
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // === Trivia ===
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    // === Keywords ===
    #[token("int")]
    Int,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("while")]
    While,

    #[token("assert")]
    Assert,

    // === Delimiters ===
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semi,

    // === Arithmetic ===
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    // === Comparison ===
    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("==")]
    EqEq,

    #[token("!=")]
    Ne,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    // === Assignment ===
    #[token("=")]
    Assign,

    // === Literals ===
    #[regex(r"[0-9]+")]
    Number,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Token {
    /// Returns true if this token is trivia (whitespace/comments)
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::LineComment | Token::BlockComment
        )
    }
}

/// A lexed token: kind, matched text, and its span.
/// Lex errors (illegal characters) are reported as `Err(span)`.
pub type LexedToken<'a> = Result<(Token, &'a str, Span), Span>;

/// Lex source code into tokens, including trivia
pub fn lex_all(source: &str) -> impl Iterator<Item = LexedToken<'_>> {
    Token::lexer(source).spanned().map(|(result, range)| {
        let span = Span::new(range.start as u32, range.end as u32);
        match result {
            Ok(token) => Ok((token, &source[range], span)),
            Err(()) => Err(span),
        }
    })
}

/// Lex source code into non-whitespace tokens only (for tests)
/// Note: this filters whitespace but keeps comments for testing
pub fn lex(source: &str) -> impl Iterator<Item = LexedToken<'_>> {
    lex_all(source).filter(|item| match item {
        Ok((token, _, _)) => *token != Token::Whitespace,
        Err(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(Token, &str)> {
        lex(source)
            .map(|item| {
                let (token, text, _) = item.expect("lex error");
                (token, text)
            })
            .collect()
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            kinds("int x;"),
            vec![(Token::Int, "int"), (Token::Ident, "x"), (Token::Semi, ";")]
        );
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            kinds("x = x + 1;"),
            vec![
                (Token::Ident, "x"),
                (Token::Assign, "="),
                (Token::Ident, "x"),
                (Token::Plus, "+"),
                (Token::Number, "1"),
                (Token::Semi, ";"),
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("<= < >= > == !="),
            vec![
                (Token::Le, "<="),
                (Token::Lt, "<"),
                (Token::Ge, ">="),
                (Token::Gt, ">"),
                (Token::EqEq, "=="),
                (Token::Ne, "!="),
            ]
        );
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        assert_eq!(
            kinds("while whilex if iffy"),
            vec![
                (Token::While, "while"),
                (Token::Ident, "whilex"),
                (Token::If, "if"),
                (Token::Ident, "iffy"),
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        let tokens = kinds("x // trailing comment\ny");
        assert_eq!(tokens[0], (Token::Ident, "x"));
        assert_eq!(tokens[1].0, Token::LineComment);
        assert_eq!(tokens[2], (Token::Ident, "y"));
    }

    #[test]
    fn test_block_comment() {
        let tokens = kinds("x /* a\nmultiline * comment */ y");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].0, Token::BlockComment);
        assert_eq!(tokens[2], (Token::Ident, "y"));
    }

    #[test]
    fn test_illegal_character() {
        let items: Vec<_> = lex("x @ y").collect();
        assert!(items[1].is_err());
        assert_eq!(items[1].unwrap_err(), Span::new(2, 3));
    }

    #[test]
    fn test_spans() {
        let items: Vec<_> = lex("ab = 12;").collect();
        let (_, _, span) = items[0].unwrap();
        assert_eq!(span, Span::new(0, 2));
        let (_, _, span) = items[2].unwrap();
        assert_eq!(span, Span::new(5, 7));
    }
}
