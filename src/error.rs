//! Error types.
//!
//! Load-time errors (`MalformedRuleset`, `RulesetError`) are fatal before any
//! match starts. `ConsistencyError` is raised by the interpreter when a rule
//! set produces semantics no match can use (missing goals, no roles).
//! `AgentError` is per-role and recoverable: the orchestrator turns it into a
//! disqualification. `MatchError` is why a match was aborted.

use thiserror::Error;

use crate::core::{Role, State, Symbol, Term};
use crate::orchestrator::MatchPhase;

/// A rule set violates a structural rule.
///
/// Every variant names the offending rule in its display form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRuleset {
    #[error("Rule head must be positive: {rule}")]
    NegatedHead { rule: String },

    #[error("Predicate '{predicate}' is supplied per evaluation and cannot be a rule head: {rule}")]
    ExtensionalHead { predicate: Symbol, rule: String },

    #[error("Predicate '{predicate}' used with arity {found}, expected {expected}: {rule}")]
    ArityMismatch {
        predicate: Symbol,
        expected: usize,
        found: usize,
        rule: String,
    },

    #[error("Fact must be ground: {rule}")]
    NonGroundFact { rule: String },

    #[error("Variable ?{variable} is not bound by any positive body literal: {rule}")]
    UnsafeVariable { variable: Symbol, rule: String },
}

/// A rule set cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesetError {
    #[error("Malformed rule set: {0}")]
    Malformed(#[from] MalformedRuleset),

    #[error("Unstratifiable rule set: negative recursion through {}", .predicates.iter().map(Symbol::as_str).collect::<Vec<_>>().join(", "))]
    Unstratifiable { predicates: Vec<Symbol> },
}

/// A loaded rule set derived something a match cannot use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("Rule set declares no roles")]
    NoRoles,

    #[error("Rule set declares {count} roles, at most {max} are supported")]
    TooManyRoles { count: usize, max: usize },

    #[error("No goal value derivable for role {role}")]
    MissingGoal { role: Role },

    #[error("Multiple goal values for role {role}: {values:?}")]
    MultipleGoals { role: Role, values: Vec<Term> },

    #[error("Goal value for role {role} is not an integer: {value}")]
    GoalNotInteger { role: Role, value: Term },

    #[error("Derived fact names undeclared role {role}")]
    UnexpectedRole { role: Role },

    #[error("Non-terminal state at ply {ply} has no legal move for any role")]
    Stalled { ply: u32 },
}

/// A decision-maker failed to produce a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("Deadline exceeded")]
    Timeout,

    #[error("Agent failed: {0}")]
    Failed(String),

    #[error("Agent disconnected")]
    Disconnected,

    #[error("Agent forfeits")]
    Forfeit,
}

/// Why a match was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Ruleset(#[from] RulesetError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("No agent bound for role {role}")]
    MissingAgent { role: Role },

    #[error("Agent bound for undeclared role {role}")]
    UnexpectedAgent { role: Role },

    #[error("Role {role} did not start: {source}")]
    DidNotStart {
        role: Role,
        #[source]
        source: AgentError,
    },

    #[error("All roles disqualified at ply {ply}")]
    AllDisqualified { ply: u32 },

    #[error("Ply limit of {limit} exceeded")]
    PlyLimitExceeded { limit: u32 },

    #[error("Cannot {operation} a match in phase {phase:?}")]
    InvalidPhase {
        phase: MatchPhase,
        operation: &'static str,
    },

    #[error("Failed to spawn seat for role {role}: {message}")]
    Spawn { role: Role, message: String },

    #[error("Match aborted by controller")]
    Cancelled,
}

/// A match record could not be replayed or decoded.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Replay diverged at ply {ply}: expected {expected}, derived {found}")]
    Replay {
        ply: usize,
        expected: State,
        found: State,
    },

    #[error("Record codec error: {0}")]
    Codec(#[from] bincode::Error),
}
