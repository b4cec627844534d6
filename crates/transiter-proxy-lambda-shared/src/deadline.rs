//! Per-invocation time budget.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lambda_runtime::Context;

/// Default wall-clock budget of one invocation.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(10_000);

/// Default tail of the budget reserved for reporting a failure.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_millis(1_500);

/// How long the dispatcher lets a translation run.
///
/// The effective deadline is the smaller of the time the Lambda context has
/// left and the configured budget, minus the safety margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub time_budget: Duration,
    pub safety_margin: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_BUDGET, DEFAULT_SAFETY_MARGIN)
    }
}

impl DeadlinePolicy {
    pub fn new(time_budget: Duration, safety_margin: Duration) -> Self {
        Self {
            time_budget,
            safety_margin,
        }
    }

    /// Budget left once the margin is reserved.
    pub fn usable_budget(&self) -> Duration {
        self.time_budget.saturating_sub(self.safety_margin)
    }

    /// Time available for a translation.
    ///
    /// `deadline_ms` is the Lambda deadline in milliseconds since the Unix
    /// epoch; zero means the invocation carries no deadline (local runs).
    pub fn remaining(&self, deadline_ms: u64, now: SystemTime) -> Duration {
        let usable = self.usable_budget();
        if deadline_ms == 0 {
            return usable;
        }
        let now_ms = now
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        let left = Duration::from_millis(deadline_ms.saturating_sub(now_ms));
        left.saturating_sub(self.safety_margin).min(usable)
    }

    pub fn for_context(&self, context: &Context) -> Duration {
        self.remaining(context.deadline, SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn no_context_deadline_uses_budget_minus_margin() {
        let policy = DeadlinePolicy::default();
        assert_eq!(policy.remaining(0, at(5_000)), Duration::from_millis(8_500));
    }

    #[test]
    fn short_context_deadline_wins() {
        let policy = DeadlinePolicy::default();
        let now = 1_700_000_000_000;
        assert_eq!(
            policy.remaining(now + 4_000, at(now)),
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn long_context_deadline_is_capped_by_budget() {
        let policy = DeadlinePolicy::default();
        let now = 1_700_000_000_000;
        assert_eq!(
            policy.remaining(now + 900_000, at(now)),
            Duration::from_millis(8_500)
        );
    }

    #[test]
    fn passed_deadline_leaves_nothing() {
        let policy = DeadlinePolicy::default();
        let now = 1_700_000_000_000;
        assert_eq!(policy.remaining(now - 10, at(now)), Duration::ZERO);
        assert_eq!(policy.remaining(now + 1_000, at(now)), Duration::ZERO);
    }

    #[test]
    fn default_context_has_no_deadline() {
        let policy = DeadlinePolicy::new(Duration::from_secs(2), Duration::from_millis(500));
        assert_eq!(
            policy.for_context(&Context::default()),
            Duration::from_millis(1_500)
        );
    }
}
