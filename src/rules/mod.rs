//! Rule storage, stratification, evaluation and interpretation.
//!
//! - `store`: validated rules and the predicate dependency graph
//! - `stratify`: SCC-based stratum order, rejecting negative recursion
//! - `evaluator`: semi-naive fixpoint over one stratum at a time
//! - `ruleset`: the three above, computed once per game
//! - `engine`: the `RulesEngine` trait the orchestrator calls into
//! - `interpreter`: `RulesEngine` over a loaded rule set

pub mod store;
pub mod stratify;
pub mod evaluator;
pub mod ruleset;
pub mod engine;
pub mod interpreter;

pub use store::{DependencyGraph, Edge, RuleStore};
pub use stratify::{stratify, Strata, Stratum};
pub use evaluator::{evaluate, Evaluator, FactStore};
pub use ruleset::Ruleset;
pub use engine::{Position, RulesEngine};
pub use interpreter::Interpreter;
