//! The match state machine.
//!
//! `Initializing → Active → {Concluded, Aborted}`.
//!
//! ## Ply loop
//!
//! 1. Analyze the current state (terminal flag, legal moves, views)
//! 2. Send a move request to every active role that has a legal move
//! 3. Wait for each reply until that role's clock deadline
//! 4. Substitute the default move for roles that are not active
//! 5. Derive the next state from the joint move and append the ply
//!
//! A role that times out, answers with an illegal move or fails is out for
//! the rest of the match; the other roles play on.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::agents::{Agent, HistoryEntry, MatchInfo, MoveRequest};
use crate::clock::{ClockOutcome, GameClock, Stage};
use crate::core::{
    DefaultMovePolicy, GameRng, JointMove, MatchConfig, Move, Role, RoleId, RoleMap, Rule, State, MAX_ROLES,
};
use crate::error::{AgentError, ConsistencyError, MatchError};
use crate::rules::{Interpreter, Position, RulesEngine};

use super::record::{Disqualification, MatchRecord, RoleStatus};
use super::seat::{Pending, Seat};
use super::MatchPhase;

/// One role's place in a concluded match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub role: Role,
    /// 1-based; tied roles share a rank.
    pub rank: usize,
    pub goal: i64,
    /// False if the role was timed out or disqualified.
    pub active: bool,
}

/// How a match ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    /// Standings best first.
    Concluded { standings: Vec<Standing> },
    Aborted { reason: MatchError },
}

/// Final status plus the full record.
#[derive(Clone, Debug)]
pub struct MatchResult {
    pub status: MatchStatus,
    pub record: MatchRecord,
}

impl MatchResult {
    fn aborted(reason: MatchError, record: MatchRecord) -> Self {
        Self {
            status: MatchStatus::Aborted { reason },
            record,
        }
    }

    /// True if the match reached a terminal state.
    #[must_use]
    pub fn is_concluded(&self) -> bool {
        matches!(self.status, MatchStatus::Concluded { .. })
    }

    /// Standings best first; empty for an aborted match.
    #[must_use]
    pub fn standings(&self) -> &[Standing] {
        match &self.status {
            MatchStatus::Concluded { standings } => standings,
            MatchStatus::Aborted { .. } => &[],
        }
    }

    /// Why the match was aborted.
    #[must_use]
    pub fn abort_reason(&self) -> Option<&MatchError> {
        match &self.status {
            MatchStatus::Aborted { reason } => Some(reason),
            MatchStatus::Concluded { .. } => None,
        }
    }

    /// A role's goal value, if the match concluded.
    #[must_use]
    pub fn goal(&self, role: &Role) -> Option<i64> {
        self.record.goal(role)
    }
}

/// What one call to [`Match::execute_ply`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlyOutcome {
    /// A ply was played.
    Played { ply: u32, joint_move: JointMove },
    /// The state was terminal; the match is now concluded.
    Concluded,
}

/// A match in progress.
///
/// ```
/// use std::sync::Arc;
/// use rust_ggp::agents::{Agent, ArbitraryAgent};
/// use rust_ggp::core::{MatchConfig, Role};
/// use rust_ggp::games::counter;
/// use rust_ggp::orchestrator::Match;
/// use rust_ggp::rules::Interpreter;
///
/// let engine = Arc::new(Interpreter::from_rules(counter::rules(3)).unwrap());
/// let agents: Vec<(Role, Box<dyn Agent>)> = vec![
///     (Role::new("first"), Box::new(ArbitraryAgent)),
///     (Role::new("second"), Box::new(ArbitraryAgent)),
/// ];
/// let result = Match::new(engine, agents, MatchConfig::default()).unwrap().run();
///
/// assert!(result.is_concluded());
/// assert_eq!(result.record.len(), 3);
/// assert_eq!(result.goal(&Role::new("second")), Some(100));
/// ```
pub struct Match<E: RulesEngine + ?Sized> {
    engine: Arc<E>,
    config: MatchConfig,
    phase: MatchPhase,
    roles: Vec<Role>,
    seats: RoleMap<Seat>,
    clocks: RoleMap<GameClock>,
    statuses: RoleMap<RoleStatus>,
    history: RoleMap<Vec<HistoryEntry>>,
    state: State,
    record: MatchRecord,
    rng: GameRng,
    ply: u32,
    outcome: Option<MatchStatus>,
}

impl<E: RulesEngine + ?Sized> Match<E> {
    /// Bind one agent to every role and put each on its own seat thread.
    ///
    /// Fails if a role has no agent, an agent names an undeclared role or a
    /// role is bound twice.
    pub fn new(
        engine: Arc<E>,
        agents: Vec<(Role, Box<dyn Agent>)>,
        config: MatchConfig,
    ) -> Result<Self, MatchError> {
        let roles = engine.roles().to_vec();
        if roles.is_empty() {
            return Err(ConsistencyError::NoRoles.into());
        }
        if roles.len() > MAX_ROLES {
            return Err(ConsistencyError::TooManyRoles {
                count: roles.len(),
                max: MAX_ROLES,
            }
            .into());
        }

        let mut bound: Vec<Option<Box<dyn Agent>>> = roles.iter().map(|_| None).collect();
        for (role, agent) in agents {
            let Some(id) = engine.role_id(&role) else {
                return Err(MatchError::UnexpectedAgent { role });
            };
            let slot = &mut bound[id.index()];
            if slot.is_some() {
                return Err(MatchError::UnexpectedAgent { role });
            }
            *slot = Some(agent);
        }

        let mut seats = Vec::with_capacity(roles.len());
        for (role, agent) in roles.iter().zip(bound) {
            let agent = agent.ok_or_else(|| MatchError::MissingAgent { role: role.clone() })?;
            seats.push(Seat::spawn(role.clone(), agent)?);
        }

        let clocks: Vec<GameClock> = roles
            .iter()
            .map(|role| GameClock::new(config.clock_for(role).clone()))
            .collect();
        let state = engine.init_state();
        let record = MatchRecord::new(roles.clone(), state.clone());
        let role_count = roles.len();
        info!(
            "Match created: {}",
            seats
                .iter()
                .map(|seat| format!("{}={}", seat.role(), seat.agent_name()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            engine,
            rng: GameRng::new(config.seed),
            config,
            phase: MatchPhase::Initializing,
            roles,
            seats: RoleMap::from_vec(seats),
            clocks: RoleMap::from_vec(clocks),
            statuses: RoleMap::with_default(role_count),
            history: RoleMap::with_default(role_count),
            state,
            record,
            ply: 0,
            outcome: None,
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Number of plies played so far.
    #[must_use]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    #[must_use]
    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    #[must_use]
    pub fn status(&self, role: RoleId) -> &RoleStatus {
        self.statuses.get(role)
    }

    #[must_use]
    pub fn clock(&self, role: RoleId) -> &GameClock {
        self.clocks.get(role)
    }

    /// Final status once the match is finished.
    #[must_use]
    pub fn outcome(&self) -> Option<&MatchStatus> {
        self.outcome.as_ref()
    }

    // === Lifecycle ===

    /// Send the start signal to every agent and wait for them under their
    /// start clocks. A role that fails or runs out of start time aborts the
    /// match.
    ///
    /// With a zero start clock the signal is sent without waiting; the time
    /// the agent spends on it counts against its first move.
    pub fn start(&mut self) -> Result<(), MatchError> {
        self.expect_phase(MatchPhase::Initializing, "start")?;
        let views = self.engine.sees(&self.state);
        let now = Instant::now();

        let mut pending = Vec::with_capacity(self.roles.len());
        for id in RoleId::all(self.roles.len()) {
            let info = MatchInfo {
                role: self.roles[id.index()].clone(),
                roles: self.roles.clone(),
                clock: self.clocks.get(id).config().clone(),
                initial_view: views.get(id).clone(),
            };
            match self.seats.get(id).prepare(info) {
                Ok(reply) => pending.push((id, reply)),
                Err(err) => return Err(self.fail_start(id, err)),
            }
        }

        for (id, reply) in pending {
            let clock = self.clocks.get_mut(id);
            if !clock.is_unbounded() && clock.config().start_clock.is_zero() {
                continue;
            }
            let deadline = clock.begin(Stage::Start, now);
            let result = match reply.wait(deadline) {
                Ok(reply) => match clock.finish(reply.finished_at) {
                    ClockOutcome::InTime { .. } => reply.result,
                    ClockOutcome::Expired { .. } => Err(AgentError::Timeout),
                },
                Err(AgentError::Timeout) => {
                    clock.expire(Instant::now());
                    self.seats.get_mut(id).wedge();
                    Err(AgentError::Timeout)
                }
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                return Err(self.fail_start(id, err));
            }
        }

        self.phase = MatchPhase::Active;
        info!("Match started with {} roles", self.roles.len());
        Ok(())
    }

    /// Play one ply, or conclude the match if the current state is terminal.
    ///
    /// An error means the match was aborted; the reason is also kept in
    /// [`outcome`](Self::outcome).
    pub fn execute_ply(&mut self) -> Result<PlyOutcome, MatchError> {
        self.expect_phase(MatchPhase::Active, "play")?;
        let position = self.engine.analyze(&self.state);

        if position.terminal {
            self.conclude()?;
            return Ok(PlyOutcome::Concluded);
        }
        if let Some(limit) = self.config.max_plies {
            if self.ply >= limit {
                return Err(self.fail(MatchError::PlyLimitExceeded { limit }));
            }
        }

        let movers: Vec<RoleId> = position.roles_to_move().collect();
        if movers.is_empty() {
            return Err(self.fail(ConsistencyError::Stalled { ply: self.ply }.into()));
        }

        let mut chosen = self.collect_moves(&position, &movers);

        if self.config.abort_when_all_disqualified
            && self.statuses.iter().all(|(_, status)| !status.is_active())
        {
            return Err(self.fail(MatchError::AllDisqualified { ply: self.ply }));
        }

        let mut rng = self.rng.fork();
        let mut joint = JointMove::new();
        for id in movers {
            let action = chosen
                .get_mut(id)
                .take()
                .or_else(|| default_move(&self.config.default_move, position.legal.get(id), &mut rng));
            if let Some(action) = action {
                joint.insert(self.roles[id.index()].clone(), action);
            }
        }

        for id in RoleId::all(self.roles.len()) {
            if self.seats.get(id).wants_history() {
                self.history.get_mut(id).push(HistoryEntry {
                    ply: self.ply,
                    view: position.views.get(id).clone(),
                    action: joint.get(&self.roles[id.index()]).cloned(),
                });
            }
        }

        let next = self.engine.next_state(&self.state, &joint);
        debug!("Ply {}: {}", self.ply, joint);
        self.record.push(joint.clone(), next.clone());
        self.state = next;

        let ply = self.ply;
        self.ply += 1;
        Ok(PlyOutcome::Played {
            ply,
            joint_move: joint,
        })
    }

    /// Stop the match from outside.
    pub fn abort(&mut self, reason: MatchError) -> Result<(), MatchError> {
        if self.phase.is_finished() {
            return Err(MatchError::InvalidPhase {
                phase: self.phase,
                operation: "abort",
            });
        }
        self.fail(reason);
        Ok(())
    }

    /// Start the match and play it to the end.
    pub fn run(mut self) -> MatchResult {
        if self.start().is_ok() {
            while let Ok(PlyOutcome::Played { .. }) = self.execute_ply() {}
        }
        self.into_result()
    }

    /// Finish the match, aborting it with [`MatchError::Cancelled`] if it is
    /// still running.
    pub fn into_result(mut self) -> MatchResult {
        if self.outcome.is_none() {
            self.fail(MatchError::Cancelled);
        }
        let status = self.outcome.take().unwrap_or(MatchStatus::Aborted {
            reason: MatchError::Cancelled,
        });
        MatchResult {
            status,
            record: self.record,
        }
    }

    // === Internals ===

    fn expect_phase(&self, phase: MatchPhase, operation: &'static str) -> Result<(), MatchError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(MatchError::InvalidPhase {
                phase: self.phase,
                operation,
            })
        }
    }

    /// Poll every active mover concurrently. Returns the legal moves that
    /// arrived in time; every other mover's status has been updated.
    fn collect_moves(&mut self, position: &Position, movers: &[RoleId]) -> RoleMap<Option<Move>> {
        let mut chosen: RoleMap<Option<Move>> = RoleMap::with_default(self.roles.len());
        let now = Instant::now();

        let mut pending: Vec<(RoleId, Option<Instant>, Pending<Move>)> = Vec::with_capacity(movers.len());
        for &id in movers {
            if !self.statuses.get(id).is_active() {
                continue;
            }
            let clock = self.clocks.get_mut(id);
            let remaining = clock.remaining(Stage::Play);
            let deadline = clock.begin(Stage::Play, now);
            let seat = self.seats.get(id);
            let request = MoveRequest {
                role: seat.role().clone(),
                ply: self.ply,
                view: position.views.get(id).clone(),
                legal_moves: position.legal.get(id).clone(),
                remaining,
                deadline,
                history: seat.wants_history().then(|| self.history.get(id).clone()),
            };
            match seat.propose(request) {
                Ok(reply) => pending.push((id, deadline, reply)),
                Err(err) => self.disqualify_for(id, err),
            }
        }

        for (id, deadline, reply) in pending {
            match reply.wait(deadline) {
                Ok(reply) => {
                    let outcome = self.clocks.get_mut(id).finish(reply.finished_at);
                    if !outcome.in_time() {
                        self.time_out(id, outcome);
                        continue;
                    }
                    match reply.result {
                        Ok(action) if position.legal.get(id).contains(&action) => {
                            *chosen.get_mut(id) = Some(action);
                        }
                        Ok(action) => self.disqualify(
                            id,
                            Disqualification::IllegalMove {
                                ply: self.ply,
                                attempted: action,
                                legal: position.legal.get(id).clone(),
                            },
                        ),
                        Err(AgentError::Timeout) => self.time_out(id, outcome),
                        Err(err) => self.disqualify_for(id, err),
                    }
                }
                Err(AgentError::Timeout) => {
                    let outcome = self.clocks.get_mut(id).expire(Instant::now());
                    self.seats.get_mut(id).wedge();
                    self.time_out(id, outcome);
                }
                Err(err) => self.disqualify_for(id, err),
            }
        }
        chosen
    }

    fn time_out(&mut self, id: RoleId, outcome: ClockOutcome) {
        let elapsed = outcome.elapsed();
        warn!(
            "Role {} timed out at ply {} after {:?}",
            self.roles[id.index()],
            self.ply,
            elapsed
        );
        *self.statuses.get_mut(id) = RoleStatus::TimedOut {
            ply: self.ply,
            elapsed,
        };
    }

    fn disqualify_for(&mut self, id: RoleId, err: AgentError) {
        let reason = match err {
            AgentError::Forfeit => Disqualification::Forfeited { ply: self.ply },
            err => Disqualification::Crashed {
                ply: self.ply,
                message: err.to_string(),
            },
        };
        self.disqualify(id, reason);
    }

    fn disqualify(&mut self, id: RoleId, reason: Disqualification) {
        warn!("Role {} disqualified: {:?}", self.roles[id.index()], reason);
        *self.statuses.get_mut(id) = RoleStatus::Disqualified(reason);
    }

    fn fail_start(&mut self, id: RoleId, err: AgentError) -> MatchError {
        *self.statuses.get_mut(id) = RoleStatus::Disqualified(Disqualification::DidNotStart {
            message: err.to_string(),
        });
        self.fail(MatchError::DidNotStart {
            role: self.roles[id.index()].clone(),
            source: err,
        })
    }

    fn conclude(&mut self) -> Result<(), MatchError> {
        let goals = match self.engine.goals(&self.state) {
            Ok(goals) => goals,
            Err(err) => return Err(self.fail(err.into())),
        };
        let views = self.engine.sees(&self.state);
        for (id, seat) in self.seats.iter() {
            seat.conclude(views.get(id).clone(), *goals.get(id));
        }
        self.close_seats();

        let standings = rank(&self.roles, &goals, &self.statuses);
        self.sync_statuses();
        self.record.goals = Some(goals.iter().map(|(_, goal)| *goal).collect());
        self.record.complete = true;
        self.phase = MatchPhase::Concluded;
        info!(
            "Match concluded after {} plies: {}",
            self.ply,
            standings
                .iter()
                .map(|s| format!("{}. {} ({})", s.rank, s.role, s.goal))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.outcome = Some(MatchStatus::Concluded { standings });
        Ok(())
    }

    fn fail(&mut self, reason: MatchError) -> MatchError {
        warn!("Match aborted at ply {}: {}", self.ply, reason);
        for (_, seat) in self.seats.iter() {
            seat.abort();
        }
        self.close_seats();
        self.sync_statuses();
        self.record.goals = None;
        self.record.complete = false;
        self.phase = MatchPhase::Aborted;
        self.outcome = Some(MatchStatus::Aborted {
            reason: reason.clone(),
        });
        reason
    }

    fn close_seats(&mut self) {
        for (_, seat) in self.seats.iter_mut() {
            seat.close();
        }
    }

    fn sync_statuses(&mut self) {
        self.record.statuses = self.statuses.iter().map(|(_, status)| status.clone()).collect();
    }
}

/// The move played for a mover that produced none of its own.
fn default_move(policy: &DefaultMovePolicy, legal: &[Move], rng: &mut GameRng) -> Option<Move> {
    match policy {
        DefaultMovePolicy::FirstLegal => legal.first().cloned(),
        DefaultMovePolicy::Reserved(action) => Some(action.clone()),
        DefaultMovePolicy::Random => rng.choose(legal).cloned(),
    }
}

/// Active roles ahead of the rest, then goal descending. Ties share the
/// better rank.
fn rank(roles: &[Role], goals: &RoleMap<i64>, statuses: &RoleMap<RoleStatus>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = RoleId::all(roles.len())
        .map(|id| Standing {
            role: roles[id.index()].clone(),
            rank: 0,
            goal: *goals.get(id),
            active: statuses.get(id).is_active(),
        })
        .collect();
    standings.sort_by(|a, b| b.active.cmp(&a.active).then(b.goal.cmp(&a.goal)));

    let mut previous = None;
    let mut rank = 0;
    for (i, standing) in standings.iter_mut().enumerate() {
        let key = (standing.active, standing.goal);
        if previous != Some(key) {
            rank = i + 1;
            previous = Some(key);
        }
        standing.rank = rank;
    }
    standings
}

/// Load `rules`, bind `agents` and play the match to the end.
///
/// Rule sets that fail to load and agent bindings that do not match the
/// declared roles produce an aborted result with an empty record.
pub fn run_match(
    rules: impl IntoIterator<Item = Rule>,
    agents: Vec<(Role, Box<dyn Agent>)>,
    config: MatchConfig,
) -> MatchResult {
    let engine = match Interpreter::from_rules(rules) {
        Ok(engine) => Arc::new(engine),
        Err(reason) => {
            warn!("Match aborted before start: {reason}");
            return MatchResult::aborted(reason, MatchRecord::new(Vec::new(), State::new()));
        }
    };
    let record = MatchRecord::new(engine.roles().to_vec(), engine.init_state());
    match Match::new(engine, agents, config) {
        Ok(game) => game.run(),
        Err(reason) => {
            warn!("Match aborted before start: {reason}");
            MatchResult::aborted(reason, record)
        }
    }
}
