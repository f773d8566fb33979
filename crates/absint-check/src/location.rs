//! Program points of the equation system
//!
//! A program lowers to a flat sequence of locations, one per statement plus
//! one closing location per `if` and `while`. Each location owns the store
//! slots it computes; slots are `Rc`-shared so a consumer reads the very
//! store object its producer published. All cross-location reads are wired
//! statically by the builder as [`StoreRef`]s into the sequence: references
//! to earlier locations resolve to the current iteration's stores,
//! references to later locations (the loop back edge) resolve to the
//! previous iteration's stores, which is exactly the Jacobi scheme.

use std::fmt;
use std::rc::Rc;

use absint_core::ast::{Cond, Expr};
use absint_core::{Span, Spanned};
use absint_domain::Store;

/// Where a location reads a store from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRef {
    /// Output of the preceding location in the chain; the precondition
    /// store at the front of the sequence
    Chain,
    /// `last_store` of the location at this index
    Output(usize),
    /// True-branch entry store published by the if header at this index
    IfBranch(usize),
    /// False-branch entry store published by the if header at this index
    ElseBranch(usize),
    /// Loop-body entry store published by the while header at this index
    LoopBody(usize),
    /// Loop-exit store published by the while header at this index
    LoopExit(usize),
}

/// A program point with its store slots
#[derive(Debug, Clone)]
pub enum Location {
    /// `x = e`
    Assignment {
        var: Spanned<String>,
        value: Spanned<Expr>,
        input: StoreRef,
        before: Option<Rc<Store>>,
        after: Option<Rc<Store>>,
    },
    /// `assert(e op e)`; threads its input through during iteration,
    /// evaluated only in the final reporting pass
    PostCondition {
        cond: Cond,
        span: Span,
        input: StoreRef,
        store: Option<Rc<Store>>,
    },
    /// `if (x op e)`; publishes the restricted entry stores of both branches
    IfHeader {
        cond: Cond,
        /// The validated left-hand variable of the condition
        var: String,
        has_else: bool,
        input: StoreRef,
        before: Option<Rc<Store>>,
        if_branch: Option<Rc<Store>>,
        else_branch: Option<Rc<Store>>,
    },
    /// Join point closing an `if`; for a missing or empty else branch the
    /// builder wires `after_else_body` to the header's false-branch store
    EndIf {
        after_if_body: StoreRef,
        after_else_body: StoreRef,
        after_join: Option<Rc<Store>>,
    },
    /// `while (x op e)`; the loop head combines its entry store with the
    /// back-edge feedback, then publishes body-entry and exit stores
    WhileHeader {
        cond: Cond,
        /// The validated left-hand variable of the condition
        var: String,
        input: StoreRef,
        /// Back edge: the output of the last loop-body location
        feedback: StoreRef,
        before: Option<Rc<Store>>,
        /// The (joined, possibly widened) store at the loop head
        head: Option<Rc<Store>>,
        body: Option<Rc<Store>>,
        exit: Option<Rc<Store>>,
    },
    /// Closes a `while`; carries the loop-exit store onward
    EndWhile {
        exit: StoreRef,
        after: Option<Rc<Store>>,
    },
}

impl Location {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Location::Assignment { .. } => "assignment",
            Location::PostCondition { .. } => "postcondition",
            Location::IfHeader { .. } => "if-header",
            Location::EndIf { .. } => "end-if",
            Location::WhileHeader { .. } => "while-header",
            Location::EndWhile { .. } => "end-while",
        }
    }

    /// The store downstream locations read when this one is their
    /// predecessor in the chain
    pub fn last_store(&self) -> Option<Rc<Store>> {
        match self {
            Location::Assignment { after, .. } => after.clone(),
            Location::PostCondition { store, .. } => store.clone(),
            Location::IfHeader { if_branch, .. } => if_branch.clone(),
            Location::EndIf { after_join, .. } => after_join.clone(),
            Location::WhileHeader { body, .. } => body.clone(),
            Location::EndWhile { after, .. } => after.clone(),
        }
    }

    /// Wire the predecessor's output into this location's input slot
    pub fn set_previous_store(&mut self, store: Rc<Store>) {
        match self {
            Location::Assignment { before, .. } => *before = Some(store),
            Location::PostCondition { store: slot, .. } => *slot = Some(store),
            Location::IfHeader { before, .. } => *before = Some(store),
            Location::WhileHeader { before, .. } => *before = Some(store),
            // Closing locations read their inputs through static refs
            Location::EndIf { .. } | Location::EndWhile { .. } => {}
        }
    }

    /// The true-branch store, if this is an if header
    pub fn if_branch_store(&self) -> Option<Rc<Store>> {
        match self {
            Location::IfHeader { if_branch, .. } => if_branch.clone(),
            _ => None,
        }
    }

    /// The false-branch store, if this is an if header
    pub fn else_branch_store(&self) -> Option<Rc<Store>> {
        match self {
            Location::IfHeader { else_branch, .. } => else_branch.clone(),
            _ => None,
        }
    }

    /// The loop-body entry store, if this is a while header
    pub fn loop_body_store(&self) -> Option<Rc<Store>> {
        match self {
            Location::WhileHeader { body, .. } => body.clone(),
            _ => None,
        }
    }

    /// The loop-exit store, if this is a while header
    pub fn loop_exit_store(&self) -> Option<Rc<Store>> {
        match self {
            Location::WhileHeader { exit, .. } => exit.clone(),
            _ => None,
        }
    }

    /// Compare this location's output slots against a prior snapshot of
    /// the same location. Stability of every location is the fixpoint
    /// criterion.
    pub fn is_stable(&self, old: &Location) -> bool {
        match (self, old) {
            (
                Location::Assignment { after: a, .. },
                Location::Assignment { after: b, .. },
            ) => same_store(a, b),
            (
                Location::PostCondition { store: a, .. },
                Location::PostCondition { store: b, .. },
            ) => same_store(a, b),
            (
                Location::IfHeader {
                    if_branch: ta,
                    else_branch: ea,
                    ..
                },
                Location::IfHeader {
                    if_branch: tb,
                    else_branch: eb,
                    ..
                },
            ) => same_store(ta, tb) && same_store(ea, eb),
            (
                Location::EndIf { after_join: a, .. },
                Location::EndIf { after_join: b, .. },
            ) => same_store(a, b),
            (
                Location::WhileHeader {
                    head: ha,
                    body: ba,
                    exit: xa,
                    ..
                },
                Location::WhileHeader {
                    head: hb,
                    body: bb,
                    exit: xb,
                    ..
                },
            ) => same_store(ha, hb) && same_store(ba, bb) && same_store(xa, xb),
            (Location::EndWhile { after: a, .. }, Location::EndWhile { after: b, .. }) => {
                same_store(a, b)
            }
            _ => false,
        }
    }
}

/// Value equality of two optional shared stores
fn same_store(a: &Option<Rc<Store>>, b: &Option<Rc<Store>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a == b,
        _ => false,
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Assignment { var, after, .. } => {
                write!(f, "assignment {}", var.node)?;
                fmt_slot(f, "after", after)
            }
            Location::PostCondition { cond, store, .. } => {
                write!(f, "postcondition {cond}")?;
                fmt_slot(f, "store", store)
            }
            Location::IfHeader {
                cond,
                if_branch,
                else_branch,
                ..
            } => {
                write!(f, "if-header {cond}")?;
                fmt_slot(f, "then", if_branch)?;
                fmt_slot(f, "else", else_branch)
            }
            Location::EndIf { after_join, .. } => {
                f.write_str("end-if")?;
                fmt_slot(f, "after", after_join)
            }
            Location::WhileHeader {
                cond,
                head,
                body,
                exit,
                ..
            } => {
                write!(f, "while-header {cond}")?;
                fmt_slot(f, "head", head)?;
                fmt_slot(f, "body", body)?;
                fmt_slot(f, "exit", exit)
            }
            Location::EndWhile { after, .. } => {
                f.write_str("end-while")?;
                fmt_slot(f, "after", after)
            }
        }
    }
}

/// Render a store slot as ` label={x: [0, 1], y: empty}` on one line
fn fmt_slot(f: &mut fmt::Formatter<'_>, label: &str, slot: &Option<Rc<Store>>) -> fmt::Result {
    write!(f, " {label}=")?;
    match slot {
        None => f.write_str("unset"),
        Some(store) => {
            f.write_str("{")?;
            let mut first = true;
            for (name, interval) in store.iter() {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{name}: {interval}")?;
                first = false;
            }
            f.write_str("}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use absint_core::ast::{CmpOp, Expr};
    use absint_domain::Interval;

    fn store(name: &str, interval: Interval) -> Rc<Store> {
        let mut s = Store::new();
        s.set(name, interval);
        Rc::new(s)
    }

    fn assignment(after: Option<Rc<Store>>) -> Location {
        Location::Assignment {
            var: Spanned::dummy("x".to_string()),
            value: Spanned::dummy(Expr::Int(1)),
            input: StoreRef::Chain,
            before: None,
            after,
        }
    }

    #[test]
    fn test_stability_compares_outputs_by_value() {
        let a = assignment(Some(store("x", Interval::new(0, 1))));
        let b = assignment(Some(store("x", Interval::new(0, 1))));
        let c = assignment(Some(store("x", Interval::new(0, 2))));
        assert!(a.is_stable(&b));
        assert!(!a.is_stable(&c));
        assert!(!a.is_stable(&assignment(None)));
        assert!(assignment(None).is_stable(&assignment(None)));
    }

    #[test]
    fn test_stability_ignores_input_slots() {
        let out = store("x", Interval::new(0, 1));
        let mut a = assignment(Some(out.clone()));
        let b = assignment(Some(out));
        a.set_previous_store(store("x", Interval::new(5, 5)));
        assert!(a.is_stable(&b));
    }

    #[test]
    fn test_last_store_per_kind() {
        let out = store("x", Interval::new(1, 2));
        assert_eq!(
            assignment(Some(out.clone())).last_store().as_deref(),
            Some(out.as_ref())
        );

        let end_while = Location::EndWhile {
            exit: StoreRef::LoopExit(0),
            after: Some(out.clone()),
        };
        assert_eq!(end_while.last_store().as_deref(), Some(out.as_ref()));

        let header = Location::IfHeader {
            cond: Cond {
                lhs: Spanned::dummy(Expr::Var("x".to_string())),
                op: CmpOp::Le,
                rhs: Spanned::dummy(Expr::Int(3)),
            },
            var: "x".to_string(),
            has_else: false,
            input: StoreRef::Chain,
            before: None,
            if_branch: Some(out.clone()),
            else_branch: None,
        };
        assert_eq!(header.last_store().as_deref(), Some(out.as_ref()));
        assert_eq!(header.if_branch_store().as_deref(), Some(out.as_ref()));
        assert!(header.else_branch_store().is_none());
    }

    #[test]
    fn test_display_compact() {
        let loc = assignment(Some(store("x", Interval::new(0, 5))));
        assert_eq!(loc.to_string(), "assignment x after={x: [0, 5]}");
        assert_eq!(assignment(None).to_string(), "assignment x after=unset");
    }
}
