//! Match records.
//!
//! A record captures a complete match:
//! - The state before each ply and the joint move played in it
//! - Each role's final status
//! - Goal values, once the match concluded
//!
//! Records are append-only while the match runs and can be replayed against
//! the rules that produced them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{JointMove, Move, Role, State};
use crate::error::RecordError;
use crate::rules::RulesEngine;

/// Why a role lost its seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disqualification {
    /// `prepare` failed or ran past the start clock.
    DidNotStart { message: String },
    /// Returned a move outside its legal set.
    IllegalMove {
        ply: u32,
        attempted: Move,
        legal: Vec<Move>,
    },
    /// The agent failed or went away.
    Crashed { ply: u32, message: String },
    /// The agent withdrew.
    Forfeited { ply: u32 },
}

/// A role's standing in the match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleStatus {
    #[default]
    Active,
    /// Missed a deadline at `ply`.
    TimedOut { ply: u32, elapsed: Duration },
    Disqualified(Disqualification),
}

impl RoleStatus {
    /// True while the role's agent is still being asked for moves.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, RoleStatus::Active)
    }
}

/// One ply: the state it started from and the joint move played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlyRecord {
    pub state: State,
    pub joint_move: JointMove,
}

/// The full history of one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Roles in declaration order.
    pub roles: Vec<Role>,
    pub initial_state: State,
    pub plies: Vec<PlyRecord>,
    /// The state after the last ply.
    pub final_state: State,
    /// Per role, aligned with `roles`.
    pub statuses: Vec<RoleStatus>,
    /// Per role, aligned with `roles`. Set only when the match concluded.
    pub goals: Option<Vec<i64>>,
    /// False if the match was aborted.
    pub complete: bool,
}

impl MatchRecord {
    /// Start a record at `initial_state`.
    pub fn new(roles: Vec<Role>, initial_state: State) -> Self {
        let statuses = vec![RoleStatus::Active; roles.len()];
        Self {
            roles,
            final_state: initial_state.clone(),
            initial_state,
            plies: Vec::new(),
            statuses,
            goals: None,
            complete: false,
        }
    }

    /// Append a ply. `next` becomes the final state.
    pub fn push(&mut self, joint_move: JointMove, next: State) {
        let state = std::mem::replace(&mut self.final_state, next);
        self.plies.push(PlyRecord { state, joint_move });
    }

    /// Number of plies played.
    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    fn index_of(&self, role: &Role) -> Option<usize> {
        self.roles.iter().position(|r| r == role)
    }

    /// A role's final status.
    pub fn status(&self, role: &Role) -> Option<&RoleStatus> {
        self.index_of(role).and_then(|i| self.statuses.get(i))
    }

    /// A role's goal value, if the match concluded.
    pub fn goal(&self, role: &Role) -> Option<i64> {
        let index = self.index_of(role)?;
        self.goals.as_ref().and_then(|goals| goals.get(index).copied())
    }

    /// Every state the match passed through, initial and final included.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.plies
            .iter()
            .map(|ply| &ply.state)
            .chain(std::iter::once(&self.final_state))
    }

    /// Re-derive every state from the initial state and check it matches.
    pub fn replay<E: RulesEngine + ?Sized>(&self, engine: &E) -> Result<(), RecordError> {
        let mut state = engine.init_state();
        if state != self.initial_state {
            return Err(RecordError::Replay {
                ply: 0,
                expected: self.initial_state.clone(),
                found: state,
            });
        }

        for (ply, record) in self.plies.iter().enumerate() {
            if state != record.state {
                return Err(RecordError::Replay {
                    ply,
                    expected: record.state.clone(),
                    found: state,
                });
            }
            state = engine.next_state(&state, &record.joint_move);
        }

        if state != self.final_state {
            return Err(RecordError::Replay {
                ply: self.plies.len(),
                expected: self.final_state.clone(),
                found: state,
            });
        }
        Ok(())
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
