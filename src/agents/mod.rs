//! Decision-makers bound to roles.
//!
//! The orchestrator depends only on the `Agent` trait. Variants:
//! - `ArbitraryAgent`: first legal move
//! - `RandomAgent`: uniformly random legal move
//! - `ScriptedAgent`: replays a fixed script (moves, delays, failures)
//! - `ForfeitAgent`: refuses every request
//! - `ChannelAgent`: forwards requests to a human or remote controller

pub mod agent;
pub mod basic;
pub mod channel;

pub use agent::{Agent, HistoryEntry, MatchInfo, MoveRequest};
pub use basic::{ArbitraryAgent, ForfeitAgent, Journal, RandomAgent, ScriptStep, ScriptedAgent};
pub use channel::{ChannelAgent, ChannelController, ControllerEvent};
