//! absint-domain - Interval abstract domain
//!
//! This crate provides the value side of the analysis:
//!
//! - [`Lattice`]: join/meet/widen/narrow operations shared by all domains
//! - [`Interval`]: integer bounds `[lb, ub]` with an explicit ⊥ marker
//! - [`Store`]: variable-to-interval mapping with deterministic iteration
//!
//! # Example
//!
//! ```
//! use absint_domain::{Interval, Lattice, Store};
//!
//! // x in [0, 10]
//! let x = Interval::new(0, 10);
//! assert!(Interval::new(-100, 100).contains(&x));
//!
//! // Merging at a control flow join point
//! let then_branch = Interval::new(0, 0);
//! let else_branch = Interval::new(100, 100);
//! assert_eq!(then_branch.join(&else_branch), Interval::new(0, 100));
//!
//! // Stores read unbound names as ⊤
//! let store = Store::new();
//! assert!(store.get("y").is_top());
//! ```

pub mod interval;
pub mod lattice;
pub mod store;

pub use interval::Interval;
pub use lattice::Lattice;
pub use store::Store;
