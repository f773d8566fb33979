//! Core lattice operations for abstract interpretation.
//!
//! A lattice is a partially ordered set where every pair of elements has:
//! - A least upper bound (join, ⊔) - combines information from branches
//! - A greatest lower bound (meet, ⊓) - intersects constraints
//!
//! Special elements:
//! - Bottom (⊥) - no information, unreachable code
//! - Top (⊤) - all possible values, unknown

/// A lattice element with join, meet, and ordering operations.
pub trait Lattice: Clone + PartialEq + Sized {
    /// The bottom element (⊥) - represents unreachable/no information.
    fn bottom() -> Self;

    /// The top element (⊤) - represents all possible values.
    fn top() -> Self;

    /// Check if this is the bottom element.
    fn is_bottom(&self) -> bool;

    /// Check if this is the top element.
    fn is_top(&self) -> bool;

    /// Least upper bound (join, ⊔).
    /// Used when merging information from different control flow paths.
    fn join(&self, other: &Self) -> Self;

    /// Greatest lower bound (meet, ⊓).
    /// Used when intersecting constraints.
    fn meet(&self, other: &Self) -> Self;

    /// Check if self ⊑ other (more precise ⊑ less precise).
    fn leq(&self, other: &Self) -> bool;

    /// Widening operator for accelerating fixed-point computation.
    /// Default implementation is just join, but domains with infinite
    /// ascending chains must override this to ensure termination.
    #[inline]
    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }

    /// Narrowing operator for improving precision after widening.
    /// Default implementation is just meet.
    #[inline]
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }
}
