//! Variable-to-interval stores
//!
//! A store maps variable names to intervals. Iteration order is
//! lexicographic by name, so equality checks and printed dumps are
//! deterministic across runs.

use std::collections::BTreeMap;
use std::fmt;

use crate::interval::Interval;
use crate::lattice::Lattice;

/// An abstract store: variable name → interval
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Store {
    vars: BTreeMap<String, Interval>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to an interval
    pub fn set(&mut self, name: impl Into<String>, interval: Interval) {
        self.vars.insert(name.into(), interval);
    }

    /// Read a variable; names never bound read as ⊤
    pub fn get(&self, name: &str) -> Interval {
        self.vars.get(name).copied().unwrap_or_else(Interval::top)
    }

    /// Whether the variable has an explicit binding
    pub fn contains_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterate bindings in lexicographic name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Interval)> {
        self.vars.iter().map(|(name, interval)| (name.as_str(), interval))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// A store is unreachable when any variable has no possible value
    pub fn is_unreachable(&self) -> bool {
        self.vars.values().any(Interval::is_bottom)
    }

    /// Pointwise join over the union of keys; a name bound on only one
    /// side adopts that side's interval
    pub fn join_all(&mut self, other: &Store) {
        for (name, interval) in &other.vars {
            match self.vars.get_mut(name) {
                Some(existing) => *existing = existing.join(interval),
                None => {
                    self.vars.insert(name.clone(), *interval);
                }
            }
        }
    }

    /// Pointwise widening: `self ▽ other` over the union of keys
    pub fn widen_from(&self, other: &Store) -> Store {
        self.combine(other, Interval::widen)
    }

    /// Pointwise narrowing: `self Δ other` over the union of keys
    pub fn narrow_from(&self, other: &Store) -> Store {
        self.combine(other, Interval::narrow)
    }

    fn combine(&self, other: &Store, op: impl Fn(&Interval, &Interval) -> Interval) -> Store {
        let mut result = self.clone();
        for (name, interval) in &other.vars {
            match result.vars.get_mut(name) {
                Some(existing) => *existing = op(existing, interval),
                None => {
                    result.vars.insert(name.clone(), *interval);
                }
            }
        }
        result
    }

    /// Copy of this store with one variable rebound
    pub fn with(&self, name: impl Into<String>, interval: Interval) -> Store {
        let mut result = self.clone();
        result.set(name, interval);
        result
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, interval) in &self.vars {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{name}: {interval}")?;
            first = false;
        }
        Ok(())
    }
}
