//! Built-in agents.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::{GameRng, Move, View};
use crate::error::AgentError;

use super::agent::{Agent, MatchInfo, MoveRequest};

fn first_legal(request: &MoveRequest) -> Result<Move, AgentError> {
    request
        .legal_moves
        .first()
        .cloned()
        .ok_or_else(|| AgentError::Failed(format!("no legal moves for {}", request.role)))
}

// =============================================================================
// Arbitrary
// =============================================================================

/// Always plays the first legal move.
#[derive(Clone, Debug, Default)]
pub struct ArbitraryAgent;

impl Agent for ArbitraryAgent {
    fn name(&self) -> &str {
        "arbitrary"
    }

    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError> {
        first_legal(request)
    }
}

// =============================================================================
// Random
// =============================================================================

/// Plays a uniformly random legal move.
///
/// The stream is derived from the seed and the role name at `prepare`, so
/// two random agents with the same seed in different roles still differ.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    seed: u64,
    rng: GameRng,
}

impl RandomAgent {
    /// Create a random agent.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: GameRng::new(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn prepare(&mut self, info: &MatchInfo) -> Result<(), AgentError> {
        self.rng = GameRng::new(self.seed).for_context(&info.role.to_string());
        Ok(())
    }

    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError> {
        match self.rng.choose(&request.legal_moves) {
            Some(action) => Ok(action.clone()),
            None => first_legal(request),
        }
    }
}

// =============================================================================
// Forfeit
// =============================================================================

/// Refuses every move request. Stand-in for a role that has withdrawn.
#[derive(Clone, Debug, Default)]
pub struct ForfeitAgent;

impl Agent for ForfeitAgent {
    fn name(&self) -> &str {
        "forfeit"
    }

    fn propose_move(&mut self, _request: &MoveRequest) -> Result<Move, AgentError> {
        Err(AgentError::Forfeit)
    }
}

// =============================================================================
// Scripted
// =============================================================================

/// One scripted response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// Return this move, legal or not.
    Play(Move),
    /// Sleep, then return this move.
    PlayAfter(Move, Duration),
    /// Return the first legal move.
    FirstLegal,
    /// Return an error.
    Fail(String),
}

/// What a scripted agent was told, for inspection after the match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Journal {
    pub prepared: bool,
    /// (ply, legal move count) per request received.
    pub requests: Vec<(u32, usize)>,
    /// History length per request, if history was sent.
    pub history: Vec<Option<usize>>,
    /// Set by `conclude`.
    pub outcome: Option<(View, i64)>,
    pub aborted: bool,
}

/// Replays a fixed script, one step per move request.
///
/// Once the script runs out every further request fails.
#[derive(Debug)]
pub struct ScriptedAgent {
    steps: VecDeque<ScriptStep>,
    prepare_delay: Duration,
    prepare_failure: Option<String>,
    history: bool,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedAgent {
    /// Create an agent that answers with `steps` in order.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            prepare_delay: Duration::ZERO,
            prepare_failure: None,
            history: false,
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    /// Sleep this long in `prepare`.
    #[must_use]
    pub fn with_prepare_delay(mut self, delay: Duration) -> Self {
        self.prepare_delay = delay;
        self
    }

    /// Fail `prepare` with this message.
    #[must_use]
    pub fn with_prepare_failure(mut self, message: impl Into<String>) -> Self {
        self.prepare_failure = Some(message.into());
        self
    }

    /// Ask for history in move requests.
    #[must_use]
    pub fn with_history(mut self) -> Self {
        self.history = true;
        self
    }

    /// Shared handle to the journal; stays readable after the agent is
    /// moved onto its seat thread.
    #[must_use]
    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    fn record(&self, update: impl FnOnce(&mut Journal)) {
        if let Ok(mut journal) = self.journal.lock() {
            update(&mut journal);
        }
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn prepare(&mut self, _info: &MatchInfo) -> Result<(), AgentError> {
        if !self.prepare_delay.is_zero() {
            std::thread::sleep(self.prepare_delay);
        }
        if let Some(message) = &self.prepare_failure {
            return Err(AgentError::Failed(message.clone()));
        }
        self.record(|j| j.prepared = true);
        Ok(())
    }

    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError> {
        self.record(|j| {
            j.requests.push((request.ply, request.legal_moves.len()));
            j.history.push(request.history.as_ref().map(Vec::len));
        });
        match self.steps.pop_front() {
            Some(ScriptStep::Play(action)) => Ok(action),
            Some(ScriptStep::PlayAfter(action, delay)) => {
                std::thread::sleep(delay);
                Ok(action)
            }
            Some(ScriptStep::FirstLegal) => first_legal(request),
            Some(ScriptStep::Fail(message)) => Err(AgentError::Failed(message)),
            None => Err(AgentError::Failed("script exhausted".into())),
        }
    }

    fn conclude(&mut self, view: &View, goal: i64) {
        let view = view.clone();
        self.record(|j| j.outcome = Some((view, goal)));
    }

    fn abort(&mut self) {
        self.record(|j| j.aborted = true);
    }

    fn wants_history(&self) -> bool {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Role, Term};

    fn request(moves: Vec<Move>) -> MoveRequest {
        MoveRequest {
            role: Role::new("first"),
            ply: 0,
            view: View::new(),
            legal_moves: moves,
            remaining: None,
            deadline: None,
            history: None,
        }
    }

    fn take(n: i64) -> Move {
        Move::new(Term::compound("take", vec![Term::int(n)]))
    }

    #[test]
    fn test_arbitrary_plays_first() {
        let mut agent = ArbitraryAgent;
        assert_eq!(agent.propose_move(&request(vec![take(1), take(2)])), Ok(take(1)));
        assert!(agent.propose_move(&request(vec![])).is_err());
    }

    #[test]
    fn test_random_is_legal_and_deterministic() {
        let info = MatchInfo {
            role: Role::new("first"),
            roles: vec![Role::new("first")],
            clock: crate::core::ClockConfig::unbounded(),
            initial_view: View::new(),
        };
        let moves: Vec<Move> = (1..=10).map(take).collect();

        let mut a = RandomAgent::new(9);
        let mut b = RandomAgent::new(9);
        a.prepare(&info).unwrap();
        b.prepare(&info).unwrap();

        for _ in 0..20 {
            let chosen = a.propose_move(&request(moves.clone())).unwrap();
            assert!(moves.contains(&chosen));
            assert_eq!(Ok(chosen), b.propose_move(&request(moves.clone())));
        }
    }

    #[test]
    fn test_forfeit_always_refuses() {
        assert_eq!(ForfeitAgent.propose_move(&request(vec![take(1)])), Err(AgentError::Forfeit));
    }

    #[test]
    fn test_scripted_steps_and_journal() {
        let mut agent = ScriptedAgent::new(vec![
            ScriptStep::Play(take(7)),
            ScriptStep::FirstLegal,
            ScriptStep::Fail("boom".into()),
        ]);
        let journal = agent.journal();

        assert_eq!(agent.propose_move(&request(vec![take(1)])), Ok(take(7)));
        assert_eq!(agent.propose_move(&request(vec![take(2)])), Ok(take(2)));
        assert_eq!(
            agent.propose_move(&request(vec![take(1)])),
            Err(AgentError::Failed("boom".into()))
        );
        assert_eq!(
            agent.propose_move(&request(vec![take(1)])),
            Err(AgentError::Failed("script exhausted".into()))
        );
        agent.abort();

        let journal = journal.lock().unwrap();
        assert_eq!(journal.requests.len(), 4);
        assert!(journal.aborted);
        assert!(!journal.prepared);
    }
}
