//! Role identification and per-role data storage.
//!
//! ## Role
//!
//! A role is the ground term named by a `role/1` fact (`role(white)`).
//!
//! ## RoleId / RoleMap
//!
//! Once a match resolves its roles, each gets a dense 0-based `RoleId` in
//! declaration order, and per-role bookkeeping (clocks, statuses, seats)
//! lives in a `RoleMap` backed by `Vec` for O(1) access.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::term::Term;

/// A role named by a `role/1` fact.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role(pub Term);

impl Role {
    /// Create a role from a constant name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Term::constant(name))
    }

    /// The role as a term.
    #[must_use]
    pub fn term(&self) -> &Term {
        &self.0
    }
}

impl From<Term> for Role {
    fn from(term: Term) -> Self {
        Self(term)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({})", self.0)
    }
}

/// Largest role count a game may declare.
pub const MAX_ROLES: usize = u8::MAX as usize;

/// Dense role index supporting 1-255 roles.
///
/// Role indices are 0-based in `role/1` declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub u8);

impl RoleId {
    /// Create a new role ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Role ID for a 0-based index, `None` past [`MAX_ROLES`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().filter(|_| index < MAX_ROLES).map(Self)
    }

    /// Get the raw role index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all role IDs for a game with `role_count` roles.
    ///
    /// ```
    /// use rust_ggp::core::RoleId;
    ///
    /// let roles: Vec<_> = RoleId::all(3).collect();
    /// assert_eq!(roles, vec![RoleId::new(0), RoleId::new(1), RoleId::new(2)]);
    /// ```
    pub fn all(role_count: usize) -> impl Iterator<Item = RoleId> {
        (0..role_count as u8).map(RoleId)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role #{}", self.0)
    }
}

/// Per-role data storage with O(1) access.
///
/// ```
/// use rust_ggp::core::{RoleId, RoleMap};
///
/// let mut strikes: RoleMap<u32> = RoleMap::with_value(2, 0);
/// strikes[RoleId::new(1)] += 1;
/// assert_eq!(strikes[RoleId::new(0)], 0);
/// assert_eq!(strikes[RoleId::new(1)], 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleMap<T> {
    data: Vec<T>,
}

impl<T> RoleMap<T> {
    /// Create a new RoleMap with values from a factory function.
    pub fn new(role_count: usize, factory: impl FnMut(RoleId) -> T) -> Self {
        assert!(role_count > 0, "Must have at least 1 role");
        assert!(role_count <= MAX_ROLES, "At most 255 roles supported");

        let data = (0..role_count as u8).map(RoleId).map(factory).collect();

        Self { data }
    }

    /// Create a RoleMap from values already in role order.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 role");
        assert!(data.len() <= MAX_ROLES, "At most 255 roles supported");
        Self { data }
    }

    /// Create a new RoleMap with all entries set to the same value.
    pub fn with_value(role_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(role_count, |_| value.clone())
    }

    /// Create a new RoleMap with default values.
    pub fn with_default(role_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(role_count, |_| T::default())
    }

    /// Get the number of roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to a role's data.
    #[must_use]
    pub fn get(&self, role: RoleId) -> &T {
        &self.data[role.index()]
    }

    /// Get a mutable reference to a role's data.
    pub fn get_mut(&mut self, role: RoleId) -> &mut T {
        &mut self.data[role.index()]
    }

    /// Iterate over (RoleId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (RoleId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (RoleId(i as u8), v))
    }

    /// Iterate over (RoleId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RoleId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (RoleId(i as u8), v))
    }

    /// Iterate over all role IDs.
    pub fn role_ids(&self) -> impl Iterator<Item = RoleId> {
        (0..self.data.len() as u8).map(RoleId)
    }

    /// Find the first role whose data satisfies `predicate`.
    pub fn position(&self, predicate: impl Fn(&T) -> bool) -> Option<RoleId> {
        self.data.iter().position(predicate).map(|i| RoleId(i as u8))
    }

    /// Map every entry to a new RoleMap.
    pub fn map<U>(&self, mut f: impl FnMut(RoleId, &T) -> U) -> RoleMap<U> {
        RoleMap {
            data: self.iter().map(|(id, v)| f(id, v)).collect(),
        }
    }
}

impl<T> Index<RoleId> for RoleMap<T> {
    type Output = T;

    fn index(&self, role: RoleId) -> &Self::Output {
        self.get(role)
    }
}

impl<T> IndexMut<RoleId> for RoleMap<T> {
    fn index_mut(&mut self, role: RoleId) -> &mut Self::Output {
        self.get_mut(role)
    }
}
