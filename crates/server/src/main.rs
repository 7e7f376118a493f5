//! Service bootstrap.
//!
//! Wires the deferred-publish scheduler into a long-running process: init
//! observability, read configuration overrides from the environment, start
//! the poller, run until SIGINT, stop with join semantics.
//!
//! This binary wires the in-memory collaborators (development mode). A
//! deployment replaces the store/bus/notifier construction with its real
//! document-store, broker, and SEO clients; everything else stays the same.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use pressroom_events::InMemoryMessageBus;
use pressroom_scheduler::{DisabledSearchNotifier, InMemoryContentStore, Scheduler, SchedulerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pressroom_observability::init();

    let config = scheduler_config_from_env();
    tracing::info!(?config, "starting pressroom server");

    let store = InMemoryContentStore::arc();
    let bus = Arc::new(InMemoryMessageBus::new());
    let scheduler = Scheduler::new(config, store, bus, Arc::new(DisabledSearchNotifier));

    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received; draining scheduler");
    scheduler.stop().await;

    Ok(())
}

/// Scheduler configuration with environment overrides.
///
/// Every knob falls back to its default; malformed values are warned about
/// and ignored rather than aborting startup.
fn scheduler_config_from_env() -> SchedulerConfig {
    let defaults = SchedulerConfig::default();

    SchedulerConfig::default()
        .with_poll_interval(env_secs(
            "PRESSROOM_POLL_INTERVAL_SECS",
            defaults.poll_interval,
        ))
        .with_max_retries(env_parse("PRESSROOM_MAX_RETRIES", defaults.max_retries))
        .with_base_backoff(env_secs(
            "PRESSROOM_BASE_BACKOFF_SECS",
            defaults.base_backoff,
        ))
        .with_quarantine_threshold(env_parse(
            "PRESSROOM_QUARANTINE_THRESHOLD",
            defaults.quarantine_threshold,
        ))
        .with_cycle_deadline(env_secs(
            "PRESSROOM_CYCLE_DEADLINE_SECS",
            defaults.cycle_deadline,
        ))
        .with_fetch_batch_size(env_parse(
            "PRESSROOM_FETCH_BATCH_SIZE",
            defaults.fetch_batch_size,
        ))
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(key, default.as_secs()))
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring malformed override");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_malformed_values() {
        // Env is process-global; use keys unique to each assertion.
        unsafe { std::env::set_var("PRESSROOM_TEST_MALFORMED", "not-a-number") };
        assert_eq!(env_parse("PRESSROOM_TEST_MALFORMED", 7u32), 7);

        unsafe { std::env::set_var("PRESSROOM_TEST_VALID", "42") };
        assert_eq!(env_parse("PRESSROOM_TEST_VALID", 7u32), 42);

        assert_eq!(env_parse("PRESSROOM_TEST_UNSET", 7u32), 7);
    }

    #[test]
    fn config_defaults_survive_an_empty_environment() {
        let config = scheduler_config_from_env();
        assert_eq!(config.max_retries, SchedulerConfig::default().max_retries);
        assert_eq!(
            config.poll_interval,
            SchedulerConfig::default().poll_interval
        );
    }
}
