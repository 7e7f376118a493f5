//! Static configuration knobs for the scheduler.
//!
//! All values are startup-time only; nothing here is runtime-mutable.

use std::time::Duration;

use crate::retry::{BackoffStrategy, RetryPolicy};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between polling cycles.
    pub poll_interval: Duration,
    /// Attempts per item per cycle (first attempt included).
    pub max_retries: u32,
    /// Base delay between retry attempts.
    pub base_backoff: Duration,
    /// Backoff growth between attempts.
    pub backoff_strategy: BackoffStrategy,
    /// Terminal failures before an item is quarantined out of the due set.
    pub quarantine_threshold: u32,
    /// Ceiling on one fetch-and-publish cycle.
    pub cycle_deadline: Duration,
    /// Maximum due items fetched per cycle.
    pub fetch_batch_size: usize,
    /// Deadline for each fire-and-forget side effect.
    pub side_effect_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_retries: 3,
            base_backoff: Duration::from_secs(5),
            backoff_strategy: BackoffStrategy::default(),
            quarantine_threshold: 5,
            cycle_deadline: Duration::from_secs(120),
            fetch_batch_size: 100,
            side_effect_timeout: Duration::from_secs(20),
        }
    }
}

impl SchedulerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff = delay;
        self
    }

    pub fn with_quarantine_threshold(mut self, threshold: u32) -> Self {
        self.quarantine_threshold = threshold;
        self
    }

    pub fn with_cycle_deadline(mut self, deadline: Duration) -> Self {
        self.cycle_deadline = deadline;
        self
    }

    pub fn with_fetch_batch_size(mut self, size: usize) -> Self {
        self.fetch_batch_size = size;
        self
    }

    pub fn with_side_effect_timeout(mut self, timeout: Duration) -> Self {
        self.side_effect_timeout = timeout;
        self
    }

    /// The retry policy the controller runs with.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: self.base_backoff,
            strategy: self.backoff_strategy,
            ..RetryPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = SchedulerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_backoff, Duration::from_secs(5));
        assert_eq!(config.quarantine_threshold, 5);
        assert_eq!(config.cycle_deadline, Duration::from_secs(120));
        assert_eq!(config.fetch_batch_size, 100);
    }

    #[test]
    fn retry_policy_carries_the_configured_knobs() {
        let config = SchedulerConfig::default()
            .with_max_retries(4)
            .with_base_backoff(Duration::from_secs(2));

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.strategy, BackoffStrategy::Linear);
    }
}
