//! Fatal structural errors raised while building the equation system

use absint_core::{CmpOp, Span};
use thiserror::Error;

/// A structural error that aborts the analysis
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// `if`/`while` conditions must compare a variable against an expression
    #[error("the left-hand side of a condition must be a variable")]
    NonVariableCondition { span: Span },

    /// Preconditions only support `<=` and `>=`
    #[error("unsupported comparison `{op}` in a precondition (only `<=` and `>=` are allowed)")]
    UnsupportedPreconditionOp { op: CmpOp, span: Span },

    /// Preconditions must relate a variable and an integer constant
    #[error("a precondition must compare a variable against an integer constant")]
    MalformedPrecondition { span: Span },
}

impl AnalysisError {
    /// The source span the error points at
    pub fn span(&self) -> Span {
        match self {
            AnalysisError::NonVariableCondition { span } => *span,
            AnalysisError::UnsupportedPreconditionOp { span, .. } => *span,
            AnalysisError::MalformedPrecondition { span } => *span,
        }
    }
}
