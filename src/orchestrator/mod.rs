//! Match orchestration.
//!
//! A [`Match`] drives one game from its initial state to a conclusion:
//! agents sit on per-role worker threads, every ply polls the roles that
//! have legal moves under their clocks, and the resulting joint move is fed
//! to the rules engine. Everything that happens is appended to a
//! [`MatchRecord`].

use serde::{Deserialize, Serialize};

pub mod match_runner;
pub mod record;
mod seat;

pub use match_runner::{run_match, Match, MatchResult, MatchStatus, PlyOutcome, Standing};
pub use record::{Disqualification, MatchRecord, PlyRecord, RoleStatus};

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Agents bound, start signal not yet sent.
    Initializing,
    /// Plies are being played.
    Active,
    /// A terminal state was reached and goals computed.
    Concluded,
    /// Stopped without a result.
    Aborted,
}

impl MatchPhase {
    /// True once the match can make no further progress.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, MatchPhase::Concluded | MatchPhase::Aborted)
    }
}
