//! Bounded retries with backoff, per item, within one cycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::warn;

use crate::executor::{AttemptOutcome, PublishExecutor};
use crate::item::ScheduledItem;

/// Backoff growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Linear backoff: base * attempt
    Linear,
    /// Exponential backoff: base * 2^(attempt-1)
    Exponential,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        // The delay grows linearly with the attempt index: 0, base, 2*base.
        // Exponential growth is available as configuration.
        Self::Linear
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per item per cycle (first attempt included).
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Backoff strategy.
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            strategy: BackoffStrategy::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with fixed delays.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Delay to wait after `attempt` (1-indexed) failed, before the next one.
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let delay_ms = match self.strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Linear => base_ms.saturating_mul(attempt as u64).min(max_ms),
            BackoffStrategy::Exponential => {
                let exp = 1u64 << (attempt - 1).min(63);
                base_ms.saturating_mul(exp).min(max_ms)
            }
        };

        Duration::from_millis(delay_ms)
    }

    /// Whether another attempt is allowed after `attempt` attempts were made.
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Terminal disposition of one item within one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// This instance won the conditional write.
    Published {
        /// Retries consumed beyond the first attempt.
        retries: u32,
    },
    /// Another writer already handled the item; nothing left to do here.
    AlreadyPublished,
    /// Every allowed attempt failed on infrastructure errors.
    Exhausted { last_error: String },
    /// The store refused the write; no attempt was worth repeating.
    Rejected { error: String },
    /// The cycle deadline preempted processing. The item stays due and
    /// carries no failure-count penalty: the scheduler chose to stop, the
    /// item did not fail.
    Cancelled,
}

/// Drives the executor for one item until a terminal outcome.
///
/// Conflicts and permanent errors terminate after a single attempt; only
/// transient errors consume retry budget. Both the attempt I/O and the
/// inter-attempt wait are bounded by the cycle deadline, so a stuck store
/// cannot hold the loop past shutdown.
pub struct RetryController {
    executor: PublishExecutor,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(executor: PublishExecutor, policy: RetryPolicy) -> Self {
        Self { executor, policy }
    }

    pub async fn run(&self, item: &ScheduledItem, deadline: Instant) -> ItemOutcome {
        let mut attempt: u32 = 1;

        loop {
            let outcome = match time::timeout_at(deadline, self.executor.attempt(item)).await {
                Ok(outcome) => outcome,
                Err(_) => return ItemOutcome::Cancelled,
            };

            match outcome {
                AttemptOutcome::Success => {
                    return ItemOutcome::Published {
                        retries: attempt - 1,
                    };
                }
                AttemptOutcome::Conflict => return ItemOutcome::AlreadyPublished,
                AttemptOutcome::Permanent(error) => return ItemOutcome::Rejected { error },
                AttemptOutcome::Transient(error) => {
                    warn!(
                        content_id = %item.id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %error,
                        "publish attempt failed"
                    );

                    if !self.policy.allows_another(attempt) {
                        return ItemOutcome::Exhausted { last_error: error };
                    }

                    let delay = self.policy.delay_after_attempt(attempt);
                    if time::timeout_at(deadline, time::sleep(delay)).await.is_err() {
                        return ItemOutcome::Cancelled;
                    }

                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_reference_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(5));
        assert_eq!(policy.strategy, BackoffStrategy::Linear);
    }

    #[test]
    fn linear_delays_grow_strictly() {
        let policy = RetryPolicy::default();

        // Waits before attempts 2 and 3: base, 2*base.
        assert_eq!(policy.delay_after_attempt(1), Duration::from_secs(5));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_secs(10));
        assert!(policy.delay_after_attempt(2) > policy.delay_after_attempt(1));
    }

    #[test]
    fn exponential_delays_double() {
        let policy = RetryPolicy {
            strategy: BackoffStrategy::Exponential,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
        };

        assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy {
            strategy: BackoffStrategy::Linear,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(8),
            max_attempts: 5,
        };

        assert_eq!(policy.delay_after_attempt(2), Duration::from_secs(8));
    }

    #[test]
    fn fixed_delay_is_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(500));

        assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(500));
    }

    #[test]
    fn attempt_budget_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!policy.allows_another(4));
    }
}
