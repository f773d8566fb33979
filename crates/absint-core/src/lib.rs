//! absint-core - Front end for the absint interval analyzer
//!
//! This crate provides:
//! - **Spans**: byte-offset source locations for every node
//! - **Lexer**: logos-derived tokenizer for the analyzed language
//! - **Parser**: recursive descent into a typed AST with error recovery
//! - **Diagnostics**: ariadne-backed rendering of errors and verdicts
//!
//! # Quick Start
//!
//! ```
//! use absint_core::parse_program;
//!
//! let program = parse_program("int x; x = 1 + 2;").unwrap();
//! assert_eq!(program.decls[0].node, "x");
//! assert_eq!(program.body.len(), 1);
//! ```

pub mod ast;
pub mod diagnostic;
pub mod span;
pub mod syntax;

pub use ast::{BinOp, CmpOp, Cond, Expr, Program, Stmt};
pub use diagnostic::{Diagnostic, Severity};
pub use span::{Span, Spanned};
pub use syntax::{ParseError, ParseResult, Parser};

/// Parse a full program; `Ok` only when the source has no syntax errors.
pub fn parse_program(source: &str) -> Result<Program, Vec<ParseError>> {
    let result = Parser::new(source).parse();
    if result.errors.is_empty() {
        Ok(result.program)
    } else {
        Err(result.errors)
    }
}
