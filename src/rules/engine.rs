//! Game-semantics trait used by the match orchestrator.
//!
//! `RulesEngine` is the seam between the orchestrator and whatever computes
//! game semantics. [`Interpreter`](super::Interpreter) implements it over a
//! declarative rule set; tests may implement it directly.
//!
//! ## Implementation Notes
//!
//! - All methods take `&self` and must be pure: same state, same answer
//! - `legal_moves` returns an empty list for a role that cannot act
//! - Move lists are sorted and free of duplicates

use crate::core::{JointMove, Move, Role, RoleId, RoleMap, State, View};
use crate::error::ConsistencyError;

/// Everything a ply needs to know about a state, computed together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// The state is terminal.
    pub terminal: bool,
    /// Legal moves per role.
    pub legal: RoleMap<Vec<Move>>,
    /// What each role perceives.
    pub views: RoleMap<View>,
}

impl Position {
    /// Roles with at least one legal move, in role order.
    pub fn roles_to_move(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.legal
            .iter()
            .filter(|(_, moves)| !moves.is_empty())
            .map(|(id, _)| id)
    }
}

/// Rules engine trait.
pub trait RulesEngine: Send + Sync {
    /// Roles in declaration order. Never empty.
    fn roles(&self) -> &[Role];

    /// The initial state.
    fn init_state(&self) -> State;

    /// The state after `joint` is played in `state`.
    fn next_state(&self, state: &State, joint: &JointMove) -> State;

    /// Legal moves for every role.
    fn legal_moves(&self, state: &State) -> RoleMap<Vec<Move>>;

    /// Each role's view of `state`.
    fn sees(&self, state: &State) -> RoleMap<View>;

    /// Goal value of every role.
    fn goals(&self, state: &State) -> Result<RoleMap<i64>, ConsistencyError>;

    /// True if `state` is terminal.
    fn is_terminal(&self, state: &State) -> bool;

    // === Convenience Methods ===

    /// Number of roles.
    fn role_count(&self) -> usize {
        self.roles().len()
    }

    /// Look up a role's dense index.
    fn role_id(&self, role: &Role) -> Option<RoleId> {
        self.roles()
            .iter()
            .position(|r| r == role)
            .and_then(RoleId::from_index)
    }

    /// Legal moves for one role.
    fn legal_moves_by_role(&self, state: &State, role: RoleId) -> Vec<Move> {
        let mut legal = self.legal_moves(state);
        std::mem::take(legal.get_mut(role))
    }

    /// True if `action` is legal for `role` in `state`.
    fn is_legal(&self, state: &State, role: RoleId, action: &Move) -> bool {
        self.legal_moves_by_role(state, role).binary_search(action).is_ok()
    }

    /// One role's view of `state`.
    fn sees_by_role(&self, state: &State, role: RoleId) -> View {
        let mut views = self.sees(state);
        std::mem::take(views.get_mut(role))
    }

    /// Goal value of one role.
    fn goal_by_role(&self, state: &State, role: RoleId) -> Result<i64, ConsistencyError> {
        Ok(*self.goals(state)?.get(role))
    }

    /// Terminal flag, legal moves and views for `state`.
    ///
    /// Implementations should override this to share work between the three.
    fn analyze(&self, state: &State) -> Position {
        Position {
            terminal: self.is_terminal(state),
            legal: self.legal_moves(state),
            views: self.sees(state),
        }
    }
}
