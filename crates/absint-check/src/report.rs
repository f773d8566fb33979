//! Analysis results: postcondition verdicts and soundness warnings

use absint_core::Span;
use serde::Serialize;

/// A soundness hazard observed during the analysis. Warnings never stop
/// the iteration; they flag places where the result over-approximates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// 0 lies in the divisor interval; the quotient is ⊤
    DivisionByZero { span: Span },
    /// Both branches of a conditional are pruned to ⊥
    UnreachableConditional { variable: String, span: Span },
    /// The then branch of a conditional is pruned to ⊥
    DeadThenBranch { variable: String, span: Span },
    /// The else branch of a conditional is pruned to ⊥
    DeadElseBranch { variable: String, span: Span },
}

/// The verdict for one postcondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// The asserted comparison, as written
    pub condition: String,
    /// Source span of the assertion
    pub span: Span,
    pub satisfied: bool,
}

/// The outcome of a full analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// Total iterations performed (ascending and narrowing phases)
    pub iterations: usize,
    /// Whether a fixpoint was reached before the iteration budget ran out
    pub converged: bool,
    /// One verdict per `assert`, in source order
    pub verdicts: Vec<Verdict>,
    /// Hazards observed in the final iteration and the verdict pass
    pub warnings: Vec<Warning>,
}

impl AnalysisReport {
    /// Whether every postcondition was satisfied
    pub fn all_satisfied(&self) -> bool {
        self.verdicts.iter().all(|v| v.satisfied)
    }
}
