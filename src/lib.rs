//! # rust-ggp
//!
//! A general game playing engine. Games are declarative rule sets; the
//! engine derives everything else from them.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded boards, pieces or turn structure.
//!    Legal moves, transitions, goals and percepts are all derived facts.
//!
//! 2. **N-Role First**: Every API takes the role set from the rule set.
//!    Turn-based games are simultaneous-move games where one role moves.
//!
//! 3. **Immutable States**: Each ply produces a new `State` value. O(1)
//!    cloning via `im-rs` persistent sets.
//!
//! ## Architecture
//!
//! - **Stratified evaluation**: Rules are validated and stratified once at
//!   load. Every query runs a semi-naive fixpoint stratum by stratum, so
//!   negation only ever reads finished relations.
//!
//! - **Hard deadlines**: Agents run on their own threads. The match loop
//!   waits on a channel until each role's clock deadline and never on the
//!   agent itself.
//!
//! ## Modules
//!
//! - `core`: Terms, rules, roles, states, moves, RNG, configuration
//! - `rules`: Rule store, stratifier, evaluator, `RulesEngine` trait
//! - `clock`: Per-role time budgets
//! - `agents`: The `Agent` trait and built-in agents
//! - `orchestrator`: Match state machine and records
//! - `games`: Sample rule sets
//! - `error`: Error types

pub mod core;
pub mod error;
pub mod rules;
pub mod clock;
pub mod agents;
pub mod orchestrator;
pub mod games;

// Re-export commonly used types
pub use crate::core::{
    Atom, Binding, Literal, Rule, Symbol, Term,
    Role, RoleId, RoleMap,
    State, View, Move, JointMove,
    GameRng,
    ClockConfig, DefaultMovePolicy, MatchConfig,
};

pub use crate::error::{
    AgentError, ConsistencyError, MalformedRuleset, MatchError, RecordError, RulesetError,
};

pub use crate::rules::{Evaluator, Interpreter, Position, RuleStore, Ruleset, RulesEngine, Strata};

pub use crate::clock::{ClockOutcome, ClockPhase, GameClock, Stage};

pub use crate::agents::{
    Agent, MatchInfo, MoveRequest,
    ArbitraryAgent, ChannelAgent, ChannelController, ForfeitAgent, RandomAgent, ScriptStep, ScriptedAgent,
};

pub use crate::orchestrator::{
    run_match, Match, MatchPhase, MatchRecord, MatchResult, MatchStatus, RoleStatus, Standing,
};
