//! Game clock state machine.
//!
//! ## Budget model
//!
//! - The start phase may use `start_clock`; unused start time is lost.
//! - Play time is one budget for the whole match. It starts at `play_clock`
//!   and every move's charge comes out of it; unused time carries over.
//! - `increment` is added back after every move delivered in time.
//! - The first `delay` of every request is never charged.
//!
//! So for a ply: `charged = max(0, elapsed - delay)`, the move is in time
//! iff `charged <= remaining`, after which
//! `remaining' = remaining - charged + increment`.
//! An unbounded clock charges nothing and never expires.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::ClockConfig;

/// Which budget a request is timed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// The start signal, timed by `start_clock`.
    Start,
    /// A move request, timed by the carried play budget.
    Play,
}

/// Clock state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockPhase {
    /// Not timing anything.
    Ready,
    /// A request is outstanding.
    Thinking {
        stage: Stage,
        started: Instant,
        /// `None` for an unbounded clock.
        deadline: Option<Instant>,
    },
    /// The budget was exceeded. Terminal.
    Expired,
}

/// Result of charging one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockOutcome {
    /// Delivered within budget.
    InTime {
        elapsed: Duration,
        /// Portion of `elapsed` counted against the budget.
        charged: Duration,
    },
    /// Budget exceeded.
    Expired {
        elapsed: Duration,
        /// What the request was allowed, delay included.
        allowance: Duration,
    },
}

impl ClockOutcome {
    /// True if the request was delivered in time.
    #[must_use]
    pub fn in_time(&self) -> bool {
        matches!(self, ClockOutcome::InTime { .. })
    }

    /// Wall-clock time the request took.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self {
            ClockOutcome::InTime { elapsed, .. } | ClockOutcome::Expired { elapsed, .. } => *elapsed,
        }
    }
}

/// One role's clock.
///
/// ```
/// use std::time::Duration;
/// use rust_ggp::clock::{GameClock, Stage};
/// use rust_ggp::core::ClockConfig;
///
/// let mut clock = GameClock::new(ClockConfig::new(Duration::ZERO, Duration::from_secs(10)));
/// assert!(clock.charge(Stage::Play, Duration::from_millis(9_999)).in_time());
/// assert!(!clock.charge(Stage::Play, Duration::from_millis(10_001)).in_time());
/// assert!(clock.is_expired());
/// ```
#[derive(Clone, Debug)]
pub struct GameClock {
    config: ClockConfig,
    remaining: Duration,
    phase: ClockPhase,
    last: Option<ClockOutcome>,
}

impl GameClock {
    /// Create a clock in the `Ready` phase holding the full play budget.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self {
            remaining: config.play_clock,
            config,
            phase: ClockPhase::Ready,
            last: None,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// True once the budget has been exceeded.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.phase == ClockPhase::Expired
    }

    /// True if this clock never expires.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.config.unbounded
    }

    /// Outcome of the most recent charge.
    #[must_use]
    pub fn last_outcome(&self) -> Option<ClockOutcome> {
        self.last
    }

    /// Chargeable budget for a request at `stage` (`None` if unbounded).
    #[must_use]
    pub fn remaining(&self, stage: Stage) -> Option<Duration> {
        if self.config.unbounded {
            return None;
        }
        Some(match stage {
            Stage::Start => self.config.start_clock,
            Stage::Play => self.remaining,
        })
    }

    /// Wall-clock time a request at `stage` may take, delay included.
    #[must_use]
    pub fn allowance(&self, stage: Stage) -> Option<Duration> {
        self.remaining(stage).map(|budget| budget + self.config.delay)
    }

    /// Start timing a request. Returns the hard deadline (`None` if
    /// unbounded). An expired clock's deadline is `now`.
    pub fn begin(&mut self, stage: Stage, now: Instant) -> Option<Instant> {
        if self.is_expired() {
            return Some(now);
        }
        let deadline = self.allowance(stage).map(|allowance| now + allowance);
        self.phase = ClockPhase::Thinking {
            stage,
            started: now,
            deadline,
        };
        deadline
    }

    /// Stop timing the outstanding request and charge it. A clock that is
    /// not thinking charges a play request of zero length.
    pub fn finish(&mut self, now: Instant) -> ClockOutcome {
        let (stage, started) = match self.phase {
            ClockPhase::Thinking { stage, started, .. } => (stage, started),
            _ => (Stage::Play, now),
        };
        self.charge(stage, now.saturating_duration_since(started))
    }

    /// Mark the outstanding request as past its deadline.
    pub fn expire(&mut self, now: Instant) -> ClockOutcome {
        let (stage, elapsed) = match self.phase {
            ClockPhase::Thinking { stage, started, .. } => (stage, now.saturating_duration_since(started)),
            _ => (Stage::Play, Duration::ZERO),
        };
        self.expire_with(stage, elapsed)
    }

    /// Charge a measured latency against the budget for `stage`.
    ///
    /// Transitions to `Ready` if in time, `Expired` otherwise.
    pub fn charge(&mut self, stage: Stage, elapsed: Duration) -> ClockOutcome {
        if self.is_expired() {
            return self.expire_with(stage, elapsed);
        }
        let charged = elapsed.saturating_sub(self.config.delay);
        let outcome = match self.remaining(stage) {
            None => ClockOutcome::InTime { elapsed, charged },
            Some(remaining) if charged > remaining => return self.expire_with(stage, elapsed),
            Some(remaining) => {
                if stage == Stage::Play {
                    self.remaining = remaining - charged + self.config.increment;
                }
                ClockOutcome::InTime { elapsed, charged }
            }
        };
        self.phase = ClockPhase::Ready;
        self.last = Some(outcome);
        outcome
    }

    fn expire_with(&mut self, stage: Stage, elapsed: Duration) -> ClockOutcome {
        let outcome = ClockOutcome::Expired {
            elapsed,
            allowance: self.allowance(stage).unwrap_or(Duration::MAX),
        };
        self.phase = ClockPhase::Expired;
        self.last = Some(outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn clock(start: u64, play: u64) -> GameClock {
        GameClock::new(ClockConfig::new(ms(start), ms(play)))
    }

    #[test]
    fn test_play_clock_exceeded_by_one_ms() {
        let mut clock = clock(0, 10_000);

        let outcome = clock.charge(Stage::Play, ms(10_001));

        assert_eq!(
            outcome,
            ClockOutcome::Expired {
                elapsed: ms(10_001),
                allowance: ms(10_000)
            }
        );
        assert!(clock.is_expired());
    }

    #[test]
    fn test_play_clock_exactly_met() {
        let mut clock = clock(0, 10_000);
        assert!(clock.charge(Stage::Play, ms(10_000)).in_time());
        assert_eq!(clock.phase(), ClockPhase::Ready);
    }

    #[test]
    fn test_unused_play_time_carries_over() {
        let mut clock = clock(0, 100);
        assert!(clock.charge(Stage::Play, ms(10)).in_time());
        assert_eq!(clock.remaining(Stage::Play), Some(ms(90)));

        assert!(clock.charge(Stage::Play, ms(60)).in_time());
        assert_eq!(clock.remaining(Stage::Play), Some(ms(30)));

        // The budget is shared across plies, so a move the play clock
        // alone would allow can still expire.
        assert!(!clock.charge(Stage::Play, ms(31)).in_time());
        assert!(clock.is_expired());
    }

    #[test]
    fn test_increment_added_after_each_move_in_time() {
        let mut clock = GameClock::new(ClockConfig::new(ms(0), ms(100)).with_increment(ms(50)));

        assert!(clock.charge(Stage::Play, ms(10)).in_time());
        assert!(clock.charge(Stage::Play, ms(10)).in_time());
        // 100 - 10 + 50 - 10 + 50
        assert_eq!(clock.remaining(Stage::Play), Some(ms(180)));

        assert!(clock.charge(Stage::Play, ms(180)).in_time());
        assert_eq!(clock.remaining(Stage::Play), Some(ms(50)));

        // No increment once expired.
        assert!(!clock.charge(Stage::Play, ms(51)).in_time());
        assert_eq!(clock.remaining(Stage::Play), Some(ms(50)));
    }

    #[test]
    fn test_delay_is_not_charged() {
        let mut clock = GameClock::new(ClockConfig::new(ms(0), ms(100)).with_delay(ms(30)));

        assert_eq!(clock.allowance(Stage::Play), Some(ms(130)));
        assert_eq!(
            clock.charge(Stage::Play, ms(125)),
            ClockOutcome::InTime {
                elapsed: ms(125),
                charged: ms(95)
            }
        );
        assert_eq!(
            clock.charge(Stage::Play, ms(20)),
            ClockOutcome::InTime {
                elapsed: ms(20),
                charged: Duration::ZERO
            }
        );
    }

    #[test]
    fn test_start_clock_is_separate() {
        let mut clock = clock(500, 100);
        assert!(clock.charge(Stage::Start, ms(400)).in_time());
        assert_eq!(clock.remaining(Stage::Play), Some(ms(100)));
        assert_eq!(clock.remaining(Stage::Start), Some(ms(500)));
        assert!(!clock.charge(Stage::Start, ms(501)).in_time());
    }

    #[test]
    fn test_unbounded_never_expires() {
        let mut clock = GameClock::new(ClockConfig::unbounded());
        assert_eq!(clock.allowance(Stage::Play), None);
        assert!(clock.charge(Stage::Play, Duration::from_secs(3600)).in_time());
        assert!(!clock.is_expired());
        assert_eq!(clock.begin(Stage::Play, Instant::now()), None);
    }

    #[test]
    fn test_expired_is_terminal() {
        let mut clock = clock(0, 10);
        assert!(!clock.charge(Stage::Play, ms(11)).in_time());
        assert!(!clock.charge(Stage::Play, ms(0)).in_time());

        let now = Instant::now();
        assert_eq!(clock.begin(Stage::Play, now), Some(now));
    }

    #[test]
    fn test_begin_finish_cycle() {
        let mut clock = clock(0, 1_000);
        let start = Instant::now();

        let deadline = clock.begin(Stage::Play, start).unwrap();
        assert_eq!(deadline, start + ms(1_000));
        assert!(matches!(clock.phase(), ClockPhase::Thinking { stage: Stage::Play, .. }));

        let outcome = clock.finish(start + ms(250));
        assert_eq!(
            outcome,
            ClockOutcome::InTime {
                elapsed: ms(250),
                charged: ms(250)
            }
        );
        assert_eq!(clock.phase(), ClockPhase::Ready);
        assert_eq!(clock.last_outcome(), Some(outcome));
    }

    #[test]
    fn test_expire_at_deadline() {
        let mut clock = clock(0, 100);
        let start = Instant::now();
        clock.begin(Stage::Play, start);

        let outcome = clock.expire(start + ms(100));

        assert_eq!(
            outcome,
            ClockOutcome::Expired {
                elapsed: ms(100),
                allowance: ms(100)
            }
        );
        assert!(clock.is_expired());
    }
}
