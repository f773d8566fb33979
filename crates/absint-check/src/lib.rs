//! absint-check - Interval analysis engine
//!
//! This crate turns a parsed program into an equation system of program
//! points and iterates it to a fixpoint:
//!
//! - **Locations**: one tagged program point per statement plus closing
//!   points for `if`/`while`, each owning shared store slots
//! - **Builder**: lowers the AST into the flat location sequence, wires
//!   every cross-location store read statically, and constructs the
//!   precondition store
//! - **Solver**: Jacobi iteration with delayed widening at loop heads and
//!   an optional narrowing phase, followed by postcondition evaluation
//!
//! # Quick Start
//!
//! ```
//! use absint_check::{analyze, SolverConfig};
//! use absint_core::parse_program;
//!
//! let program = parse_program(
//!     "int x; 0 <= x; x <= 10; x = x + 1; assert(x >= 1);",
//! )
//! .unwrap();
//! let report = analyze(&program, SolverConfig::default()).unwrap();
//! assert!(report.converged);
//! assert!(report.all_satisfied());
//! ```

pub mod builder;
pub mod error;
pub mod eval;
pub mod location;
pub mod report;
pub mod solver;

pub use builder::{build, EquationSystem};
pub use error::AnalysisError;
pub use eval::eval_expr;
pub use location::{Location, StoreRef};
pub use report::{AnalysisReport, Verdict, Warning};
pub use solver::{Solver, SolverConfig};

use absint_core::Program;

/// Build the equation system for a program and run it to a fixpoint
pub fn analyze(program: &Program, config: SolverConfig) -> Result<AnalysisReport, AnalysisError> {
    let system = build(program)?;
    let mut solver = Solver::new(system, config);
    Ok(solver.run())
}
