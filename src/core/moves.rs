//! Move representation: one ground term per role per ply.
//!
//! Moves are opaque to the engine: a move is whatever ground term appears as
//! the second argument of a `legal/2` fact, and is fed back to the evaluator
//! as the second argument of `does/2`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::literal::Atom;
use super::role::Role;
use super::term::Term;

/// A ground move term.
///
/// ```
/// use rust_ggp::core::{Move, Term};
///
/// let take = Move::new(Term::compound("take", vec![Term::int(1)]));
/// assert_eq!(take.to_string(), "take(1)");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move(pub Term);

impl Move {
    /// Wrap a term as a move.
    #[must_use]
    pub fn new(term: Term) -> Self {
        Self(term)
    }

    /// A move that is a bare constant (`noop`).
    #[must_use]
    pub fn constant(name: impl AsRef<str>) -> Self {
        Self(Term::constant(name))
    }

    /// The move as a term.
    #[must_use]
    pub fn term(&self) -> &Term {
        &self.0
    }
}

impl From<Term> for Move {
    fn from(term: Term) -> Self {
        Self(term)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.0)
    }
}

/// The moves chosen in one ply, one per role that had to move.
///
/// Ordered by role so that records and `does/2` fact sets are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointMove {
    moves: BTreeMap<Role, Move>,
}

impl JointMove {
    /// Create an empty joint move.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a role's move, replacing any previous assignment.
    pub fn insert(&mut self, role: Role, action: Move) {
        self.moves.insert(role, action);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, role: Role, action: Move) -> Self {
        self.insert(role, action);
        self
    }

    /// The move assigned to `role`.
    #[must_use]
    pub fn get(&self, role: &Role) -> Option<&Move> {
        self.moves.get(role)
    }

    /// Number of roles with an assigned move.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True if no role has a move.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Iterate over (role, move) pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &Move)> {
        self.moves.iter()
    }

    /// The `does/2` facts that present this joint move to the evaluator.
    pub fn as_facts(&self) -> impl Iterator<Item = Atom> + '_ {
        self.moves
            .iter()
            .map(|(role, action)| Atom::does(role.term().clone(), action.term().clone()))
    }
}

impl FromIterator<(Role, Move)> for JointMove {
    fn from_iter<I: IntoIterator<Item = (Role, Move)>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for JointMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (role, action)) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{role}: {action}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(n: i64) -> Move {
        Move::new(Term::compound("take", vec![Term::int(n)]))
    }

    #[test]
    fn test_move_equality() {
        assert_eq!(take(1), take(1));
        assert_ne!(take(1), take(2));
        assert_ne!(take(1), Move::constant("noop"));
    }

    #[test]
    fn test_joint_move_replaces() {
        let mut joint = JointMove::new();
        joint.insert(Role::new("first"), take(1));
        joint.insert(Role::new("first"), take(2));

        assert_eq!(joint.len(), 1);
        assert_eq!(joint.get(&Role::new("first")), Some(&take(2)));
        assert_eq!(joint.get(&Role::new("second")), None);
    }

    #[test]
    fn test_joint_move_facts() {
        let joint = JointMove::new()
            .with(Role::new("second"), Move::constant("noop"))
            .with(Role::new("first"), take(1));

        let facts: Vec<String> = joint.as_facts().map(|a| a.to_string()).collect();
        assert_eq!(facts, vec!["does(first, take(1))", "does(second, noop)"]);
    }

    #[test]
    fn test_joint_move_display() {
        let joint = JointMove::new().with(Role::new("first"), take(1));
        assert_eq!(joint.to_string(), "{first: take(1)}");
    }

    #[test]
    fn test_joint_move_serialization() {
        let joint = JointMove::new()
            .with(Role::new("first"), take(1))
            .with(Role::new("second"), Move::constant("noop"));
        let bytes = bincode::serialize(&joint).unwrap();
        let deserialized: JointMove = bincode::deserialize(&bytes).unwrap();
        assert_eq!(joint, deserialized);
    }
}
