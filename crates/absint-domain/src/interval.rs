//! The interval abstract domain
//!
//! An interval `[lb, ub]` over `i64` with an explicit empty (⊥) marker.
//! ⊥ is absorbing for meet and arithmetic, and the identity for join.
//! The top element is `[i64::MIN, i64::MAX]`.

use std::fmt;

use absint_core::CmpOp;
use tracing::warn;

use crate::lattice::Lattice;

/// An integer interval with an explicit empty flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    lb: i64,
    ub: i64,
    empty: bool,
}

impl Interval {
    /// Create an interval from two bounds; `lb > ub` collapses to ⊥
    pub fn new(lb: i64, ub: i64) -> Self {
        if lb > ub {
            Self::bottom()
        } else {
            Self {
                lb,
                ub,
                empty: false,
            }
        }
    }

    /// The point interval `[v, v]`
    pub fn singleton(v: i64) -> Self {
        Self::new(v, v)
    }

    /// Lower bound; meaningless when the interval is ⊥
    pub fn lb(&self) -> i64 {
        self.lb
    }

    /// Upper bound; meaningless when the interval is ⊥
    pub fn ub(&self) -> i64 {
        self.ub
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Swap inverted bounds
    pub fn normalize(&self) -> Self {
        if self.empty {
            *self
        } else {
            Self::new(self.lb.min(self.ub), self.lb.max(self.ub))
        }
    }

    /// Interval inclusion: every value of `other` is a value of `self`
    pub fn contains(&self, other: &Interval) -> bool {
        if other.empty {
            return true;
        }
        if self.empty {
            return false;
        }
        self.lb <= other.lb && self.ub >= other.ub
    }

    /// Whether a concrete value lies in this interval
    pub fn contains_value(&self, value: i64) -> bool {
        !self.empty && self.lb <= value && self.ub >= value
    }

    // ===========================================================================
    // Abstract semantics of expressions
    // ===========================================================================

    /// `[a,b] + [c,d] = [a+c, b+d]`
    pub fn add(&self, other: &Interval) -> Interval {
        if self.empty || other.empty {
            return Interval::bottom();
        }
        let lb = self.lb.checked_add(other.lb);
        let ub = self.ub.checked_add(other.ub);
        if lb.is_none() || ub.is_none() {
            warn!("overflow encountered in evaluating addition");
        }
        Interval::new(
            lb.unwrap_or_else(|| self.lb.saturating_add(other.lb)),
            ub.unwrap_or_else(|| self.ub.saturating_add(other.ub)),
        )
    }

    /// `[a,b] - [c,d] = [a-d, b-c]`
    pub fn sub(&self, other: &Interval) -> Interval {
        if self.empty || other.empty {
            return Interval::bottom();
        }
        let lb = self.lb.checked_sub(other.ub);
        let ub = self.ub.checked_sub(other.lb);
        if lb.is_none() || ub.is_none() {
            warn!("overflow encountered in evaluating subtraction");
        }
        Interval::new(
            lb.unwrap_or_else(|| self.lb.saturating_sub(other.ub)),
            ub.unwrap_or_else(|| self.ub.saturating_sub(other.lb)),
        )
    }

    /// `-[a,b] = [-b, -a]`
    pub fn neg(&self) -> Interval {
        if self.empty {
            return Interval::bottom();
        }
        let lb = self.ub.checked_neg();
        let ub = self.lb.checked_neg();
        if lb.is_none() || ub.is_none() {
            warn!("overflow encountered in evaluating negation");
        }
        Interval::new(
            lb.unwrap_or_else(|| self.ub.saturating_neg()),
            ub.unwrap_or_else(|| self.lb.saturating_neg()),
        )
    }

    /// `[a,b] * [c,d]`: min/max over the four corner products
    pub fn mul(&self, other: &Interval) -> Interval {
        if self.empty || other.empty {
            return Interval::bottom();
        }
        let corners = [
            (self.lb, other.lb),
            (self.lb, other.ub),
            (self.ub, other.lb),
            (self.ub, other.ub),
        ];
        let mut overflowed = false;
        let products = corners.map(|(a, b)| {
            a.checked_mul(b).unwrap_or_else(|| {
                overflowed = true;
                a.saturating_mul(b)
            })
        });
        if overflowed {
            warn!("overflow encountered in evaluating multiplication");
        }
        let lb = products.iter().copied().min().unwrap_or(i64::MIN);
        let ub = products.iter().copied().max().unwrap_or(i64::MAX);
        Interval::new(lb, ub)
    }

    /// `[a,b] / [c,d]` with truncated integer division.
    /// If the divisor interval contains 0 the quotient is unbounded and the
    /// result is ⊤; callers are expected to surface the hazard.
    pub fn div(&self, other: &Interval) -> Interval {
        if self.empty || other.empty {
            return Interval::bottom();
        }
        if other.contains_value(0) {
            return Interval::top();
        }
        let corners = [
            (self.lb, other.lb),
            (self.lb, other.ub),
            (self.ub, other.lb),
            (self.ub, other.ub),
        ];
        let mut overflowed = false;
        // The divisor excludes 0, so only i64::MIN / -1 can fail
        let quotients = corners.map(|(a, b)| {
            a.checked_div(b).unwrap_or_else(|| {
                overflowed = true;
                i64::MAX
            })
        });
        if overflowed {
            warn!("overflow encountered in evaluating division");
        }
        let lb = quotients.iter().copied().min().unwrap_or(i64::MIN);
        let ub = quotients.iter().copied().max().unwrap_or(i64::MAX);
        Interval::new(lb, ub)
    }

    // ===========================================================================
    // Condition restriction
    // ===========================================================================

    /// Refine this interval to the values that can satisfy `self op rhs`.
    ///
    /// For `!=` the removed range is only subtracted when it covers an end of
    /// the interval; a strictly interior range leaves the interval unchanged
    /// (the domain cannot represent the resulting disjunction).
    pub fn restrict(&self, op: CmpOp, rhs: &Interval) -> Interval {
        if self.empty || rhs.empty {
            return Interval::bottom();
        }
        match op {
            CmpOp::Le => self.meet(&Interval::new(i64::MIN, rhs.ub)),
            CmpOp::Lt => {
                if rhs.ub == i64::MIN {
                    Interval::bottom()
                } else {
                    self.meet(&Interval::new(i64::MIN, rhs.ub - 1))
                }
            }
            CmpOp::Ge => self.meet(&Interval::new(rhs.lb, i64::MAX)),
            CmpOp::Gt => {
                if rhs.lb == i64::MAX {
                    Interval::bottom()
                } else {
                    self.meet(&Interval::new(rhs.lb + 1, i64::MAX))
                }
            }
            CmpOp::Eq => self.meet(rhs),
            CmpOp::Ne => {
                if rhs.lb <= self.lb {
                    // Removed range covers the low end
                    let lb = self.lb.max(rhs.ub.saturating_add(1));
                    Interval::new(lb, self.ub)
                } else if rhs.ub >= self.ub {
                    // Removed range covers the high end
                    let ub = self.ub.min(rhs.lb.saturating_sub(1));
                    Interval::new(self.lb, ub)
                } else {
                    *self
                }
            }
        }
    }
}

impl Lattice for Interval {
    fn bottom() -> Self {
        Self {
            lb: 0,
            ub: 0,
            empty: true,
        }
    }

    fn top() -> Self {
        Self {
            lb: i64::MIN,
            ub: i64::MAX,
            empty: false,
        }
    }

    fn is_bottom(&self) -> bool {
        self.empty
    }

    fn is_top(&self) -> bool {
        !self.empty && self.lb == i64::MIN && self.ub == i64::MAX
    }

    fn join(&self, other: &Self) -> Self {
        if self.empty {
            return *other;
        }
        if other.empty {
            return *self;
        }
        Interval::new(self.lb.min(other.lb), self.ub.max(other.ub))
    }

    fn meet(&self, other: &Self) -> Self {
        if self.empty || other.empty {
            return Self::bottom();
        }
        // new() collapses crossed bounds to ⊥
        Interval::new(self.lb.max(other.lb), self.ub.min(other.ub))
    }

    fn leq(&self, other: &Self) -> bool {
        other.contains(self)
    }

    /// `[a,b] ▽ [c,d]`: an unstable bound jumps to the type extreme
    fn widen(&self, other: &Self) -> Self {
        if self.empty {
            return *other;
        }
        if other.empty {
            return *self;
        }
        Interval {
            lb: if other.lb < self.lb { i64::MIN } else { self.lb },
            ub: if other.ub > self.ub { i64::MAX } else { self.ub },
            empty: false,
        }
    }

    /// `[a,b] Δ [c,d]`: a bound previously widened to the extreme is refined
    fn narrow(&self, other: &Self) -> Self {
        if self.empty || other.empty {
            return Self::bottom();
        }
        Interval::new(
            if self.lb == i64::MIN { other.lb } else { self.lb },
            if self.ub == i64::MAX { other.ub } else { self.ub },
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            f.write_str("empty")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}
