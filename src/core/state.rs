//! Game positions.
//!
//! ## State
//!
//! The set of ground fluents holding in a position (the arguments of the
//! `true/1` facts supplied to the evaluator). States are immutable values:
//! each ply produces a new one and the match loop swaps its reference.
//!
//! Uses `im` persistent ordered sets: cloning is O(1), iteration order is
//! deterministic, and equality is structural.
//!
//! ## View
//!
//! The part of a position one role perceives. For rule sets with `sees/2`
//! rules it is the set of percepts derived for that role; otherwise it is
//! the full state.

use std::fmt;

use im::OrdSet;
use serde::{Deserialize, Serialize};

use super::literal::Atom;
use super::term::Term;

/// An immutable set of ground fluents.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    fluents: OrdSet<Term>,
}

impl State {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fluents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fluents.len()
    }

    /// True if no fluent holds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fluents.is_empty()
    }

    /// True if `fluent` holds.
    #[must_use]
    pub fn contains(&self, fluent: &Term) -> bool {
        self.fluents.contains(fluent)
    }

    /// Iterate over fluents in term order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.fluents.iter()
    }

    /// Return a new state with `fluent` added. `self` is unchanged.
    #[must_use]
    pub fn with(&self, fluent: Term) -> Self {
        Self {
            fluents: self.fluents.update(fluent),
        }
    }

    /// The `true/1` facts that present this state to the evaluator.
    pub fn as_facts(&self) -> impl Iterator<Item = Atom> + '_ {
        self.fluents.iter().cloned().map(Atom::holds)
    }
}

impl FromIterator<Term> for State {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self {
            fluents: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, fluent) in self.fluents.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{fluent}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State{self}")
    }
}

/// What one role perceives of a state.
pub type View = State;
