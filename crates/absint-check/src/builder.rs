//! Lowering of a program into the equation system
//!
//! The builder walks the AST once and emits the flat location sequence.
//! Declarations seed the precondition store at ⊤; precondition comparisons
//! tighten its bounds. Every cross-location store read is wired here as a
//! [`StoreRef`], including the back edge of each loop, so the solver's
//! routing needs no runtime matching.

use absint_core::ast::{CmpOp, Cond, Program, Stmt};
use absint_core::Spanned;
use absint_domain::{Interval, Lattice, Store};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::location::{Location, StoreRef};

/// The lowered program: the location sequence and the precondition store
#[derive(Debug, Clone)]
pub struct EquationSystem {
    pub locations: Vec<Location>,
    pub precondition: Store,
}

/// Lower a program into an equation system
pub fn build(program: &Program) -> Result<EquationSystem, AnalysisError> {
    let mut precondition = Store::new();
    for decl in &program.decls {
        if precondition.contains_var(&decl.node) {
            warn!(variable = %decl.node, "variable declared twice");
        }
        info!(variable = %decl.node, "declared variable");
        precondition.set(decl.node.clone(), Interval::top());
    }
    info!("declared {} variables", program.decls.len());

    for pre in &program.requires {
        apply_precondition(&mut precondition, pre)?;
    }
    info!("added {} preconditions", program.requires.len());

    let mut builder = Builder {
        locations: Vec::new(),
    };
    builder.lower_block(&program.body, StoreRef::Chain)?;
    info!("constructed {} locations", builder.locations.len());

    Ok(EquationSystem {
        locations: builder.locations,
        precondition,
    })
}

/// Tighten the precondition store with one `var rel const` assertion.
/// Only `<=` and `>=` are supported, in either orientation.
fn apply_precondition(store: &mut Store, pre: &Spanned<Cond>) -> Result<(), AnalysisError> {
    let cond = &pre.node;
    let (var, value, var_on_left) = match (cond.lhs.node.as_var(), cond.rhs.node.as_int()) {
        (Some(var), Some(value)) => (var, value, true),
        _ => match (cond.lhs.node.as_int(), cond.rhs.node.as_var()) {
            (Some(value), Some(var)) => (var, value, false),
            _ => return Err(AnalysisError::MalformedPrecondition { span: pre.span }),
        },
    };

    let current = store.get(var);
    let updated = match (cond.op, var_on_left) {
        // x <= v  or  v >= x: upper bound
        (CmpOp::Le, true) | (CmpOp::Ge, false) => Interval::new(current.lb(), value),
        // x >= v  or  v <= x: lower bound
        (CmpOp::Ge, true) | (CmpOp::Le, false) => Interval::new(value, current.ub()),
        (op, _) => {
            return Err(AnalysisError::UnsupportedPreconditionOp { op, span: pre.span })
        }
    };
    info!(variable = var, interval = %updated, "applied precondition");
    store.set(var, updated);
    Ok(())
}

struct Builder {
    locations: Vec<Location>,
}

impl Builder {
    fn push(&mut self, location: Location) -> usize {
        debug!(
            index = self.locations.len(),
            "added {} location",
            location.kind_name()
        );
        self.locations.push(location);
        self.locations.len() - 1
    }

    /// Lower a block of statements; the first one reads from `entry`.
    /// Returns the index of the last location emitted, if any.
    fn lower_block(
        &mut self,
        stmts: &[Spanned<Stmt>],
        entry: StoreRef,
    ) -> Result<Option<usize>, AnalysisError> {
        let mut last = None;
        let mut input = entry;
        for stmt in stmts {
            last = Some(self.lower_stmt(stmt, input)?);
            input = StoreRef::Chain;
        }
        Ok(last)
    }

    /// Lower one statement; returns the index of the last location emitted
    fn lower_stmt(
        &mut self,
        stmt: &Spanned<Stmt>,
        input: StoreRef,
    ) -> Result<usize, AnalysisError> {
        match &stmt.node {
            Stmt::Assign { var, value } => Ok(self.push(Location::Assignment {
                var: var.clone(),
                value: value.clone(),
                input,
                before: None,
                after: None,
            })),

            Stmt::Assert(cond) => Ok(self.push(Location::PostCondition {
                cond: cond.clone(),
                span: stmt.span,
                input,
                store: None,
            })),

            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let var = condition_variable(cond)?;
                let has_else = else_body.as_ref().is_some_and(|body| !body.is_empty());
                let header = self.push(Location::IfHeader {
                    cond: cond.clone(),
                    var,
                    has_else,
                    input,
                    before: None,
                    if_branch: None,
                    else_branch: None,
                });

                let then_last = self.lower_block(then_body, StoreRef::IfBranch(header))?;
                // An empty body's "output" is the branch entry store itself
                let after_if_body = then_last
                    .map(StoreRef::Output)
                    .unwrap_or(StoreRef::IfBranch(header));

                let after_else_body = match else_body {
                    Some(body) if !body.is_empty() => {
                        let else_last = self.lower_block(body, StoreRef::ElseBranch(header))?;
                        else_last
                            .map(StoreRef::Output)
                            .unwrap_or(StoreRef::ElseBranch(header))
                    }
                    // Without an else clause the false-branch store is the
                    // path that skipped the body
                    _ => StoreRef::ElseBranch(header),
                };

                Ok(self.push(Location::EndIf {
                    after_if_body,
                    after_else_body,
                    after_join: None,
                }))
            }

            Stmt::While { cond, body } => {
                let var = condition_variable(cond)?;
                let header = self.locations.len();
                self.push(Location::WhileHeader {
                    cond: cond.clone(),
                    var,
                    input,
                    // Patched below once the body's last location is known
                    feedback: StoreRef::LoopBody(header),
                    before: None,
                    head: None,
                    body: None,
                    exit: None,
                });

                let body_last = self.lower_block(body, StoreRef::LoopBody(header))?;
                let feedback = body_last
                    .map(StoreRef::Output)
                    .unwrap_or(StoreRef::LoopBody(header));
                if let Location::WhileHeader { feedback: slot, .. } = &mut self.locations[header]
                {
                    *slot = feedback;
                }

                Ok(self.push(Location::EndWhile {
                    exit: StoreRef::LoopExit(header),
                    after: None,
                }))
            }
        }
    }
}

/// The left operand of an `if`/`while` condition must be a variable
fn condition_variable(cond: &Cond) -> Result<String, AnalysisError> {
    cond.lhs
        .node
        .as_var()
        .map(str::to_string)
        .ok_or(AnalysisError::NonVariableCondition {
            span: cond.lhs.span,
        })
}
