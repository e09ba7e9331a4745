use gbt_core::CLOCK_BUDGET_MS;
use gbt_core::IDLE_TIMEOUT_SECS;
use gbt_core::Millis;
use std::time::Duration;
use tokio::time::Instant;

/// Which per-match clock expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The side to move sat idle past the inactivity window.
    Idle,
    /// The side to move ran out of its total budget.
    Budget,
}

/// Configuration for the two match clocks.
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    /// Inactivity window, restarted on every accepted move.
    pub idle: Duration,
    /// Total time each side may consume across the whole match.
    pub budget: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(IDLE_TIMEOUT_SECS),
            budget: Duration::from_millis(CLOCK_BUDGET_MS as u64),
        }
    }
}

/// Deadline tracking for one match: an inactivity deadline and a budget
/// deadline for the side currently to move. Both are replaced on every
/// accepted move and cleared at finalize.
#[derive(Debug)]
pub struct Clocks {
    config: ClockConfig,
    idle: Option<Instant>,
    budget: Option<Instant>,
}

impl Clocks {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            idle: None,
            budget: None,
        }
    }
    pub fn with_defaults() -> Self {
        Self::new(ClockConfig::default())
    }
    /// Remaining budget for a side that has consumed `consumed` so far.
    pub fn remaining(&self, consumed: Millis) -> Duration {
        self.config
            .budget
            .saturating_sub(Duration::from_millis(consumed.max(0) as u64))
    }
    /// Arms both deadlines for a new side to move with `remaining` budget.
    pub fn arm(&mut self, remaining: Duration) {
        let now = Instant::now();
        self.idle = Some(now + self.config.idle);
        self.budget = Some(now + remaining);
    }
    /// Disarms both deadlines. Idempotent.
    pub fn clear(&mut self) {
        self.idle = None;
        self.budget = None;
    }
    pub fn armed(&self) -> bool {
        self.idle.is_some() || self.budget.is_some()
    }
    /// The next deadline to fire, if any. The session's select loop sleeps
    /// until this instant.
    pub fn next(&self) -> Option<(Expiry, Instant)> {
        match (self.idle, self.budget) {
            (Some(i), Some(b)) if b < i => Some((Expiry::Budget, b)),
            (Some(i), _) => Some((Expiry::Idle, i)),
            (None, Some(b)) => Some((Expiry::Budget, b)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClockConfig::default();
        assert_eq!(config.idle, Duration::from_secs(60));
        assert_eq!(config.budget, Duration::from_millis(CLOCK_BUDGET_MS as u64));
    }

    #[test]
    fn clocks_start_disarmed() {
        let clocks = Clocks::with_defaults();
        assert!(!clocks.armed());
        assert!(clocks.next().is_none());
    }

    #[test]
    fn arm_sets_both_deadlines() {
        let mut clocks = Clocks::with_defaults();
        clocks.arm(clocks.remaining(0));
        assert!(clocks.armed());
        // full budget dwarfs the idle window, so idle fires first
        assert!(matches!(clocks.next(), Some((Expiry::Idle, _))));
    }

    #[test]
    fn low_budget_fires_before_idle() {
        let mut clocks = Clocks::with_defaults();
        clocks.arm(Duration::from_secs(5));
        assert!(matches!(clocks.next(), Some((Expiry::Budget, _))));
    }

    #[test]
    fn clear_disarms() {
        let mut clocks = Clocks::with_defaults();
        clocks.arm(Duration::from_secs(5));
        clocks.clear();
        clocks.clear();
        assert!(!clocks.armed());
    }

    #[test]
    fn remaining_subtracts_consumed() {
        let clocks = Clocks::with_defaults();
        let full = clocks.remaining(0);
        let less = clocks.remaining(12_000);
        assert_eq!(full - less, Duration::from_secs(12));
        assert_eq!(clocks.remaining(Millis::MAX), Duration::ZERO);
    }
}
