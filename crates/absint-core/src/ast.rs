//! Abstract syntax tree for the analyzed language
//!
//! A program is a list of variable declarations, followed by precondition
//! comparisons, followed by statements. Every node carries its source span.

use std::fmt;

use crate::span::{Span, Spanned};

/// A parsed program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Declared variables, in source order
    pub decls: Vec<Spanned<String>>,
    /// Preconditions: comparisons between a variable and a constant
    pub requires: Vec<Spanned<Cond>>,
    /// The statements to analyze
    pub body: Vec<Spanned<Stmt>>,
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `x = e;`
    Assign {
        var: Spanned<String>,
        value: Spanned<Expr>,
    },
    /// `assert(e op e);`
    Assert(Cond),
    /// `if (x op e) { ... } [else { ... }]`
    If {
        cond: Cond,
        then_body: Vec<Spanned<Stmt>>,
        else_body: Option<Vec<Spanned<Stmt>>>,
    },
    /// `while (x op e) { ... }`
    While {
        cond: Cond,
        body: Vec<Spanned<Stmt>>,
    },
}

/// A comparison between two expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub lhs: Spanned<Expr>,
    pub op: CmpOp,
    pub rhs: Spanned<Expr>,
}

impl Cond {
    /// Full source span of the comparison
    pub fn span(&self) -> Span {
        self.lhs.span.merge(self.rhs.span)
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs.node, self.op, self.rhs.node)
    }
}

/// A comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CmpOp {
    /// The operator describing the states where this comparison is false
    pub fn complement(self) -> CmpOp {
        match self {
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Ge => CmpOp::Lt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Le => "<=",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    Int(i64),
    /// Variable reference
    Var(String),
    /// Unary minus
    Neg(Box<Spanned<Expr>>),
    /// Binary operation
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// The variable name, if this expression is a bare variable
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// The literal value, if this expression is an integer constant
    /// (possibly negated)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Int(v) => Some(*v),
            Expr::Neg(inner) => inner.node.as_int().and_then(i64::checked_neg),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Var(name) => f.write_str(name),
            Expr::Neg(e) => match &e.node {
                Expr::Int(_) | Expr::Var(_) => write!(f, "-{}", e.node),
                _ => write!(f, "-({})", e.node),
            },
            Expr::Binary { op, lhs, rhs } => {
                let side = |f: &mut fmt::Formatter<'_>, e: &Expr| match e {
                    Expr::Binary { .. } => write!(f, "({e})"),
                    _ => write!(f, "{e}"),
                };
                side(f, &lhs.node)?;
                write!(f, " {op} ")?;
                side(f, &rhs.node)
            }
        }
    }
}
