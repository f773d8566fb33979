//! Recursive-descent parser for the analyzed language
//!
//! The grammar is small enough to parse straight into the AST:
//!
//! ```text
//! program   := decl* precondition* stmt*
//! decl      := "int" IDENT ";"
//! precondition := (IDENT cmp NUMBER | NUMBER cmp IDENT) ";"
//! stmt      := IDENT "=" expr ";"
//!            | "assert" "(" expr cmp expr ")" ";"
//!            | "if" "(" expr cmp expr ")" block ("else" block)?
//!            | "while" "(" expr cmp expr ")" block
//! block     := "{" stmt* "}"
//! expr      := term (("+" | "-") term)*
//! term      := factor (("*" | "/") factor)*
//! factor    := NUMBER | IDENT | "-" factor | "(" expr ")"
//! ```
//!
//! Errors are collected rather than failing fast; the parser recovers at
//! statement boundaries so several errors can be reported per run.

use crate::ast::{BinOp, CmpOp, Cond, Expr, Program, Stmt};
use crate::span::{Span, Spanned};
use crate::syntax::lexer::{lex_all, Token};

/// A parse error with location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

/// Result of parsing: a best-effort program plus any errors.
/// The program is only meaningful when `errors` is empty.
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

/// A token with its matched text and span
#[derive(Debug, Clone)]
struct ParsedToken {
    kind: Token,
    text: String,
    span: Span,
}

/// The parser state
pub struct Parser {
    tokens: Vec<ParsedToken>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a new parser for the given source
    pub fn new(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for item in lex_all(source) {
            match item {
                Ok((kind, text, span)) => {
                    if !kind.is_trivia() {
                        tokens.push(ParsedToken {
                            kind,
                            text: text.to_string(),
                            span,
                        });
                    }
                }
                Err(span) => errors.push(ParseError {
                    message: format!("unexpected character `{}`", &source[span.start as usize..span.end as usize]),
                    span,
                }),
            }
        }
        Self {
            tokens,
            pos: 0,
            errors,
        }
    }

    /// Parse the whole source
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        ParseResult {
            program,
            errors: self.errors,
        }
    }

    // === Token access ===

    fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            // Zero-width span at the end of the last token
            None => self
                .tokens
                .last()
                .map(|t| Span::new(t.span.end, t.span.end))
                .unwrap_or_default(),
        }
    }

    fn at(&self, kind: Token) -> bool {
        self.current() == Some(kind)
    }

    fn bump(&mut self) -> Option<ParsedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: Token) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: Token, what: &str) -> Option<ParsedToken> {
        if self.at(kind) {
            self.bump()
        } else {
            self.error_here(format!("expected {}", what));
            None
        }
    }

    fn error_here(&mut self, message: String) {
        let span = self.current_span();
        self.errors.push(ParseError { message, span });
    }

    /// Skip tokens until after the next `;`, stopping before `}` or at EOF
    fn recover_to_stmt_boundary(&mut self) {
        while let Some(token) = self.current() {
            match token {
                Token::Semi => {
                    self.pos += 1;
                    return;
                }
                Token::RBrace => return,
                _ => self.pos += 1,
            }
        }
    }

    // === Grammar ===

    fn parse_program(&mut self) -> Program {
        let mut decls = Vec::new();
        while self.at(Token::Int) {
            if let Some(decl) = self.parse_decl() {
                decls.push(decl);
            }
        }

        let mut requires = Vec::new();
        while self.at_precondition() {
            if let Some(pre) = self.parse_precondition() {
                requires.push(pre);
            }
        }

        let mut body = Vec::new();
        while self.current().is_some() {
            if self.at(Token::RBrace) {
                self.error_here("unmatched `}`".to_string());
                self.pos += 1;
                continue;
            }
            if let Some(stmt) = self.parse_stmt() {
                body.push(stmt);
            }
        }

        Program {
            decls,
            requires,
            body,
        }
    }

    fn parse_decl(&mut self) -> Option<Spanned<String>> {
        self.expect(Token::Int, "`int`")?;
        let name = match self.expect(Token::Ident, "a variable name after `int`") {
            Some(token) => token,
            None => {
                self.recover_to_stmt_boundary();
                return None;
            }
        };
        if self.expect(Token::Semi, "`;` after declaration").is_none() {
            self.recover_to_stmt_boundary();
        }
        Some(Spanned::new(name.text, name.span))
    }

    /// A precondition starts with a number, or with an identifier followed
    /// by a comparison operator (an identifier followed by `=` starts the
    /// statement list instead).
    fn at_precondition(&self) -> bool {
        match self.current() {
            Some(Token::Number) => true,
            Some(Token::Ident) => matches!(
                self.peek(1),
                Some(
                    Token::Le | Token::Lt | Token::Ge | Token::Gt | Token::EqEq | Token::Ne
                )
            ),
            _ => false,
        }
    }

    fn parse_precondition(&mut self) -> Option<Spanned<Cond>> {
        let cond = match self.parse_cond() {
            Some(cond) => cond,
            None => {
                self.recover_to_stmt_boundary();
                return None;
            }
        };
        if self.expect(Token::Semi, "`;` after precondition").is_none() {
            self.recover_to_stmt_boundary();
        }
        let span = cond.span();
        Some(Spanned::new(cond, span))
    }

    fn parse_stmt(&mut self) -> Option<Spanned<Stmt>> {
        match self.current() {
            Some(Token::Ident) => self.parse_assign(),
            Some(Token::Assert) => self.parse_assert(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Int) => {
                self.error_here("declarations must appear before any statement".to_string());
                self.recover_to_stmt_boundary();
                None
            }
            Some(Token::Number) => {
                self.error_here("preconditions must appear before any statement".to_string());
                self.recover_to_stmt_boundary();
                None
            }
            _ => {
                self.error_here("expected a statement".to_string());
                self.recover_to_stmt_boundary();
                None
            }
        }
    }

    fn parse_assign(&mut self) -> Option<Spanned<Stmt>> {
        let name = self.expect(Token::Ident, "a variable name")?;
        if !self.eat(Token::Assign) {
            // `x <= 3;` after the statement list has started
            if self.at_cmp_op() {
                self.error_here("preconditions must appear before any statement".to_string());
            } else {
                self.error_here(format!("expected `=` after `{}`", name.text));
            }
            self.recover_to_stmt_boundary();
            return None;
        }
        let value = match self.parse_expr() {
            Some(value) => value,
            None => {
                self.recover_to_stmt_boundary();
                return None;
            }
        };
        if self.expect(Token::Semi, "`;` after assignment").is_none() {
            self.recover_to_stmt_boundary();
        }
        let span = name.span.merge(value.span);
        Some(Spanned::new(
            Stmt::Assign {
                var: Spanned::new(name.text, name.span),
                value,
            },
            span,
        ))
    }

    fn parse_assert(&mut self) -> Option<Spanned<Stmt>> {
        let assert_token = self.expect(Token::Assert, "`assert`")?;
        self.expect(Token::LParen, "`(` after `assert`")?;
        let cond = match self.parse_cond() {
            Some(cond) => cond,
            None => {
                self.recover_to_stmt_boundary();
                return None;
            }
        };
        let close = self.expect(Token::RParen, "`)` after assertion");
        if self.expect(Token::Semi, "`;` after assertion").is_none() {
            self.recover_to_stmt_boundary();
        }
        let end = close.map(|t| t.span).unwrap_or_else(|| cond.span());
        let span = assert_token.span.merge(end);
        Some(Spanned::new(Stmt::Assert(cond), span))
    }

    fn parse_if(&mut self) -> Option<Spanned<Stmt>> {
        let if_token = self.expect(Token::If, "`if`")?;
        self.expect(Token::LParen, "`(` after `if`")?;
        let cond = self.parse_cond()?;
        self.expect(Token::RParen, "`)` after condition")?;
        let (then_body, mut end) = self.parse_block()?;

        let else_body = if self.eat(Token::Else) {
            let (body, else_end) = self.parse_block()?;
            end = else_end;
            Some(body)
        } else {
            None
        };

        let span = if_token.span.merge(end);
        Some(Spanned::new(
            Stmt::If {
                cond,
                then_body,
                else_body,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Option<Spanned<Stmt>> {
        let while_token = self.expect(Token::While, "`while`")?;
        self.expect(Token::LParen, "`(` after `while`")?;
        let cond = self.parse_cond()?;
        self.expect(Token::RParen, "`)` after condition")?;
        let (body, end) = self.parse_block()?;
        let span = while_token.span.merge(end);
        Some(Spanned::new(Stmt::While { cond, body }, span))
    }

    /// Parse `{ stmt* }`; returns the statements and the closing brace span
    fn parse_block(&mut self) -> Option<(Vec<Spanned<Stmt>>, Span)> {
        self.expect(Token::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            match self.current() {
                Some(Token::RBrace) => {
                    let close = self.bump().map(|t| t.span).unwrap_or_default();
                    return Some((stmts, close));
                }
                None => {
                    self.error_here("expected `}`".to_string());
                    return Some((stmts, self.current_span()));
                }
                _ => {
                    if let Some(stmt) = self.parse_stmt() {
                        stmts.push(stmt);
                    }
                }
            }
        }
    }

    fn at_cmp_op(&self) -> bool {
        matches!(
            self.current(),
            Some(Token::Le | Token::Lt | Token::Ge | Token::Gt | Token::EqEq | Token::Ne)
        )
    }

    fn parse_cmp_op(&mut self) -> Option<CmpOp> {
        let op = match self.current() {
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Ge) => CmpOp::Ge,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            _ => {
                self.error_here("expected a comparison operator".to_string());
                return None;
            }
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_cond(&mut self) -> Option<Cond> {
        let lhs = self.parse_expr()?;
        let op = self.parse_cmp_op()?;
        let rhs = self.parse_expr()?;
        Some(Cond { lhs, op, rhs })
    }

    fn parse_expr(&mut self) -> Option<Spanned<Expr>> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn parse_term(&mut self) -> Option<Spanned<Expr>> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_factor()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn parse_factor(&mut self) -> Option<Spanned<Expr>> {
        match self.current() {
            Some(Token::Number) => {
                let token = self.bump()?;
                match token.text.parse::<i64>() {
                    Ok(value) => Some(Spanned::new(Expr::Int(value), token.span)),
                    Err(_) => {
                        self.errors.push(ParseError {
                            message: format!("integer literal `{}` out of range", token.text),
                            span: token.span,
                        });
                        None
                    }
                }
            }
            Some(Token::Ident) => {
                let token = self.bump()?;
                Some(Spanned::new(Expr::Var(token.text), token.span))
            }
            Some(Token::Minus) => {
                let minus = self.bump()?;
                let inner = self.parse_factor()?;
                let span = minus.span.merge(inner.span);
                Some(Spanned::new(Expr::Neg(Box::new(inner)), span))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Some(inner)
            }
            _ => {
                self.error_here("expected an expression".to_string());
                None
            }
        }
    }
}
