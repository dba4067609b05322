//! Per-role time budgets.
//!
//! A `GameClock` tracks one role's budget across the start phase and every
//! ply: `Ready → Thinking → {Ready, Expired}`. The orchestrator turns the
//! clock's allowance into a hard deadline and charges measured latency back.

pub mod game_clock;

pub use game_clock::{ClockOutcome, ClockPhase, GameClock, Stage};
