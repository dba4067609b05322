//! The agent capability and the values exchanged with it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{ClockConfig, Move, Role, View};
use crate::error::AgentError;

/// Sent once before the first ply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// The role this agent plays.
    pub role: Role,
    /// All roles, in declaration order.
    pub roles: Vec<Role>,
    /// This role's clock.
    pub clock: ClockConfig,
    /// What the role perceives of the initial state.
    pub initial_view: View,
}

/// One past ply as the agent experienced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ply: u32,
    pub view: View,
    /// The move recorded for this role, if it had to move.
    pub action: Option<Move>,
}

/// An immutable snapshot handed to an agent for one decision.
#[derive(Clone, Debug)]
pub struct MoveRequest {
    pub role: Role,
    pub ply: u32,
    /// The state as this role perceives it.
    pub view: View,
    /// Sorted, non-empty.
    pub legal_moves: Vec<Move>,
    /// Chargeable budget for this ply (`None` if unbounded).
    pub remaining: Option<Duration>,
    /// Hard deadline (`None` if unbounded).
    pub deadline: Option<Instant>,
    /// Earlier plies, only for agents that ask for it.
    pub history: Option<Vec<HistoryEntry>>,
}

/// A decision-maker for one role.
///
/// Agents run on their own seat thread. A call that overruns its deadline
/// is abandoned; its eventual result is discarded and the agent receives no
/// further requests.
pub trait Agent: Send {
    /// Display name for logs.
    fn name(&self) -> &str;

    /// Start signal, timed by the start clock.
    fn prepare(&mut self, _info: &MatchInfo) -> Result<(), AgentError> {
        Ok(())
    }

    /// Choose a move.
    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError>;

    /// The match concluded with `goal` for this role.
    fn conclude(&mut self, _view: &View, _goal: i64) {}

    /// The match was aborted.
    fn abort(&mut self) {}

    /// Include history in move requests.
    fn wants_history(&self) -> bool {
        false
    }
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn prepare(&mut self, info: &MatchInfo) -> Result<(), AgentError> {
        (**self).prepare(info)
    }

    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError> {
        (**self).propose_move(request)
    }

    fn conclude(&mut self, view: &View, goal: i64) {
        (**self).conclude(view, goal);
    }

    fn abort(&mut self) {
        (**self).abort();
    }

    fn wants_history(&self) -> bool {
        (**self).wants_history()
    }
}
