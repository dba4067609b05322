//! Core engine types: terms, rules, roles, states, moves, RNG, configuration.
//!
//! This module contains the game-agnostic data model. Games are rule sets
//! built from these values; the engine never hardcodes game structure.

pub mod term;
pub mod literal;
pub mod role;
pub mod state;
pub mod moves;
pub mod rng;
pub mod config;

pub use term::{substitute, unify, unify_with, Binding, Symbol, Term};
pub use literal::{match_literal, reserved, Atom, Literal, Polarity, Rule};
pub use role::{Role, RoleId, RoleMap, MAX_ROLES};
pub use state::{State, View};
pub use moves::{JointMove, Move};
pub use rng::GameRng;
pub use config::{ClockConfig, DefaultMovePolicy, MatchConfig};
