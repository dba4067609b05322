//! Match configuration types.
//!
//! Matches are configured by providing:
//! - `ClockConfig`: per-role time budget (start, play, increment, delay)
//! - `DefaultMovePolicy`: what a disqualified role "plays"
//! - `MatchConfig`: combines both with match-wide limits

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::moves::Move;
use super::role::Role;

/// Time budget for one role.
///
/// ```
/// use std::time::Duration;
/// use rust_ggp::core::ClockConfig;
///
/// let blitz = ClockConfig::new(Duration::ZERO, Duration::from_secs(5))
///     .with_increment(Duration::from_secs(1));
/// assert_eq!(blitz.play_clock, Duration::from_secs(5));
/// assert!(!blitz.unbounded);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Budget for the start phase, before the first move only.
    pub start_clock: Duration,

    /// Play budget for the whole match. Unused time carries over to later plies.
    pub play_clock: Duration,

    /// Added back to the play budget after each move delivered in time.
    pub increment: Duration,

    /// Elapsed time per request that is never charged (transport overhead).
    pub delay: Duration,

    /// No deadline at all; the clock can never expire.
    pub unbounded: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_clock: Duration::from_secs(60),
            play_clock: Duration::from_secs(60),
            increment: Duration::ZERO,
            delay: Duration::ZERO,
            unbounded: false,
        }
    }
}

impl ClockConfig {
    /// Create a bounded clock with the given start and play clocks.
    #[must_use]
    pub fn new(start_clock: Duration, play_clock: Duration) -> Self {
        Self {
            start_clock,
            play_clock,
            ..Self::default()
        }
    }

    /// A clock that never expires.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            start_clock: Duration::ZERO,
            play_clock: Duration::ZERO,
            unbounded: true,
            ..Self::default()
        }
    }

    /// Set the per-move increment.
    #[must_use]
    pub fn with_increment(mut self, increment: Duration) -> Self {
        self.increment = increment;
        self
    }

    /// Set the uncharged delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Move substituted for a role that timed out, crashed or moved illegally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultMovePolicy {
    /// The smallest move (in term order) of the role's legal set.
    #[default]
    FirstLegal,
    /// A fixed move term (e.g. `noop`), whether or not it is legal.
    Reserved(Move),
    /// A uniformly random legal move, drawn from the match RNG.
    Random,
}

/// Complete match configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Clock used for roles without an explicit entry.
    pub default_clock: ClockConfig,

    /// Per-role clock overrides.
    pub role_clocks: Vec<(Role, ClockConfig)>,

    /// Default move policy for disqualified roles.
    pub default_move: DefaultMovePolicy,

    /// Maximum plies before the match is aborted (`None` = unlimited).
    pub max_plies: Option<u32>,

    /// Abort once every role is disqualified instead of playing on with
    /// default moves.
    pub abort_when_all_disqualified: bool,

    /// Seed for the random default-move policy.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_clock: ClockConfig::default(),
            role_clocks: Vec::new(),
            default_move: DefaultMovePolicy::FirstLegal,
            max_plies: None,
            abort_when_all_disqualified: true,
            seed: 42,
        }
    }
}

impl MatchConfig {
    /// Set the clock for all roles without an override.
    #[must_use]
    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.default_clock = clock;
        self
    }

    /// Override one role's clock.
    #[must_use]
    pub fn with_role_clock(mut self, role: Role, clock: ClockConfig) -> Self {
        self.role_clocks.retain(|(r, _)| *r != role);
        self.role_clocks.push((role, clock));
        self
    }

    /// Set the default move policy.
    #[must_use]
    pub fn with_default_move(mut self, policy: DefaultMovePolicy) -> Self {
        self.default_move = policy;
        self
    }

    /// Set the ply limit.
    #[must_use]
    pub fn with_max_plies(mut self, limit: u32) -> Self {
        self.max_plies = Some(limit);
        self
    }

    /// Keep playing when every role is disqualified.
    #[must_use]
    pub fn play_on_when_all_disqualified(mut self) -> Self {
        self.abort_when_all_disqualified = false;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The clock configuration that applies to `role`.
    #[must_use]
    pub fn clock_for(&self, role: &Role) -> &ClockConfig {
        self.role_clocks
            .iter()
            .find(|(r, _)| r == role)
            .map_or(&self.default_clock, |(_, clock)| clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.default_move, DefaultMovePolicy::FirstLegal);
        assert_eq!(config.max_plies, None);
        assert!(config.abort_when_all_disqualified);
        assert_eq!(config.default_clock.play_clock, Duration::from_secs(60));
    }

    #[test]
    fn test_role_clock_override() {
        let fast = ClockConfig::new(Duration::ZERO, Duration::from_millis(100));
        let config = MatchConfig::default()
            .with_clock(ClockConfig::unbounded())
            .with_role_clock(Role::new("second"), fast.clone());

        assert!(config.clock_for(&Role::new("first")).unbounded);
        assert_eq!(config.clock_for(&Role::new("second")), &fast);
    }

    #[test]
    fn test_role_clock_override_replaces() {
        let config = MatchConfig::default()
            .with_role_clock(Role::new("first"), ClockConfig::unbounded())
            .with_role_clock(Role::new("first"), ClockConfig::default());

        assert_eq!(config.role_clocks.len(), 1);
        assert!(!config.clock_for(&Role::new("first")).unbounded);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MatchConfig::default()
            .with_default_move(DefaultMovePolicy::Reserved(Move::constant("noop")))
            .with_max_plies(50)
            .with_seed(7)
            .play_on_when_all_disqualified();

        assert_eq!(config.max_plies, Some(50));
        assert_eq!(config.seed, 7);
        assert!(!config.abort_when_all_disqualified);
    }

    #[test]
    fn test_serialization() {
        let config = MatchConfig::default()
            .with_role_clock(Role::new("first"), ClockConfig::unbounded().with_delay(Duration::from_millis(5)));
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.role_clocks, config.role_clocks);
        assert_eq!(deserialized.default_move, config.default_move);
    }
}
