//! Abstract evaluation of expressions over interval stores

use absint_core::ast::{BinOp, Expr};
use absint_core::Spanned;
use absint_domain::{Interval, Store};
use tracing::warn;

use crate::report::Warning;

/// Evaluate an expression to an interval.
///
/// Leaves: literals become point intervals, variables read the store.
/// Division with 0 in the divisor interval yields ⊤ and records a warning.
pub fn eval_expr(expr: &Spanned<Expr>, store: &Store, warnings: &mut Vec<Warning>) -> Interval {
    match &expr.node {
        Expr::Int(value) => Interval::singleton(*value),
        Expr::Var(name) => store.get(name),
        Expr::Neg(inner) => eval_expr(inner, store, warnings).neg(),
        Expr::Binary { op, lhs, rhs } => {
            let left = eval_expr(lhs, store, warnings);
            let right = eval_expr(rhs, store, warnings);
            match op {
                BinOp::Add => left.add(&right),
                BinOp::Sub => left.sub(&right),
                BinOp::Mul => left.mul(&right),
                BinOp::Div => {
                    if right.contains_value(0) {
                        warn!("possible division by zero");
                        warnings.push(Warning::DivisionByZero { span: rhs.span });
                    }
                    left.div(&right)
                }
            }
        }
    }
}
