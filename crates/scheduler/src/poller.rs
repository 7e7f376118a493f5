//! Poller lifecycle and the fetch-publish cycle.
//!
//! Exactly one scheduler task runs per service instance. Other instances run
//! the same loop against the same store; nothing here coordinates with them.
//! The per-item conditional write is the only cross-instance synchronization.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::dispatcher::SideEffectDispatcher;
use crate::executor::PublishExecutor;
use crate::item::ScheduledItem;
use crate::retry::{ItemOutcome, RetryController};
use crate::search::SearchNotifier;
use crate::store::ContentStore;

use pressroom_events::MessageBus;

/// Poller lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Stopped = 0,
    Running = 1,
    Stopping = 2,
}

impl SchedulerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SchedulerState::Running,
            2 => SchedulerState::Stopping,
            _ => SchedulerState::Stopped,
        }
    }
}

/// Process-local counters, monotonic for the life of the scheduler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    pub cycles: u64,
    pub items_published: u64,
    pub conflicts_observed: u64,
    pub retries_exhausted: u64,
    pub writes_rejected: u64,
    pub items_quarantined: u64,
    pub deadline_aborts: u64,
}

/// Background publisher of scheduled content.
///
/// `start` transitions Stopped → Running under a single compare-and-swap and
/// spawns the loop; it returns immediately. `stop` signals the loop, waits
/// for the in-flight cycle to drain, then lands back in Stopped. The loop
/// runs one cycle immediately, then one per tick.
pub struct Scheduler {
    inner: Arc<CycleRunner>,
    state: Arc<AtomicU8>,
    shutdown: Arc<Notify>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn ContentStore>,
        bus: Arc<dyn MessageBus>,
        search: Arc<dyn SearchNotifier>,
    ) -> Self {
        let executor = PublishExecutor::new(Arc::clone(&store));
        let controller = RetryController::new(executor, config.retry_policy());
        let dispatcher = SideEffectDispatcher::new(bus, search, config.side_effect_timeout);

        Self {
            inner: Arc::new(CycleRunner {
                config,
                store,
                controller,
                dispatcher,
                stats: Mutex::new(SchedulerStats::default()),
            }),
            state: Arc::new(AtomicU8::new(SchedulerState::Stopped as u8)),
            shutdown: Arc::new(Notify::new()),
            join: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot of the scheduler's counters.
    pub fn stats(&self) -> SchedulerStats {
        self.inner.stats.lock().unwrap().clone()
    }

    /// Launch the background loop. Non-blocking; a no-op if already running.
    pub fn start(&self) {
        let swapped = self.state.compare_exchange(
            SchedulerState::Stopped as u8,
            SchedulerState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if swapped.is_err() {
            warn!("publish scheduler already running; start ignored");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = tokio::spawn(async move {
            info!(
                interval_secs = inner.config.poll_interval.as_secs(),
                "publish scheduler started"
            );

            let mut ticker = time::interval(inner.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick completes immediately, so the first cycle runs
            // on start rather than one interval later.
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown.notified() => {
                        debug!("publish scheduler received stop signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        inner.run_cycle().await;
                    }
                }
            }
        });

        *self.join.lock().unwrap() = Some(handle);
    }

    /// Signal the loop and wait for the in-flight cycle to drain. A no-op if
    /// not running.
    pub async fn stop(&self) {
        let swapped = self.state.compare_exchange(
            SchedulerState::Running as u8,
            SchedulerState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if swapped.is_err() {
            return;
        }

        self.shutdown.notify_one();

        let handle = self.join.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.state
            .store(SchedulerState::Stopped as u8, Ordering::Release);
        info!("publish scheduler stopped");
    }
}

/// Owns everything one cycle needs.
struct CycleRunner {
    config: SchedulerConfig,
    store: Arc<dyn ContentStore>,
    controller: RetryController,
    dispatcher: SideEffectDispatcher,
    stats: Mutex<SchedulerStats>,
}

impl CycleRunner {
    async fn run_cycle(&self) {
        let deadline = Instant::now() + self.config.cycle_deadline;
        let now = Utc::now();
        self.stats.lock().unwrap().cycles += 1;

        debug!(at = %now.to_rfc3339(), "checking for due scheduled content");

        let fetch = self.store.due_items(
            now,
            self.config.quarantine_threshold,
            self.config.fetch_batch_size,
        );
        let due = match time::timeout_at(deadline, fetch).await {
            Err(_) => {
                self.stats.lock().unwrap().deadline_aborts += 1;
                error!("due-item fetch hit the cycle deadline; cycle aborted");
                return;
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to fetch due scheduled content; cycle aborted");
                return;
            }
            Ok(Ok(items)) => items,
        };

        if due.is_empty() {
            debug!("no scheduled content due");
            return;
        }

        info!(count = due.len(), "found scheduled content ready to publish");

        for item in due {
            if item.id.is_nil() {
                warn!("skipping due item with nil content id");
                continue;
            }

            match self.controller.run(&item, deadline).await {
                ItemOutcome::Published { retries } => {
                    self.stats.lock().unwrap().items_published += 1;
                    info!(content_id = %item.id, retries, "published scheduled content");
                    let _ = self.dispatcher.dispatch(&item);
                }
                ItemOutcome::AlreadyPublished => {
                    self.stats.lock().unwrap().conflicts_observed += 1;
                    info!(
                        content_id = %item.id,
                        "already handled by another instance; skipping"
                    );
                }
                ItemOutcome::Exhausted { last_error } => {
                    self.stats.lock().unwrap().retries_exhausted += 1;
                    error!(
                        content_id = %item.id,
                        attempts = self.config.max_retries,
                        error = %last_error,
                        "publish retries exhausted"
                    );
                    self.record_failure(&item, &last_error, deadline).await;
                }
                ItemOutcome::Rejected { error } => {
                    self.stats.lock().unwrap().writes_rejected += 1;
                    error!(content_id = %item.id, error = %error, "publish rejected by store");
                    self.record_failure(&item, &error, deadline).await;
                }
                ItemOutcome::Cancelled => {
                    self.stats.lock().unwrap().deadline_aborts += 1;
                    warn!(
                        content_id = %item.id,
                        "cycle deadline reached mid-item; remaining batch deferred to next cycle"
                    );
                    return;
                }
            }
        }
    }

    /// Quarantine bookkeeping for a terminal failure.
    async fn record_failure(&self, item: &ScheduledItem, reason: &str, deadline: Instant) {
        let increment = self.store.record_publish_failure(item.id, reason);
        match time::timeout_at(deadline, increment).await {
            Err(_) => {
                error!(content_id = %item.id, "failure-count increment hit the cycle deadline");
            }
            Ok(Err(e)) => {
                error!(content_id = %item.id, error = %e, "failed to increment failure count");
            }
            Ok(Ok(())) => {
                let total = item.failed_attempts + 1;
                if total >= self.config.quarantine_threshold {
                    self.stats.lock().unwrap().items_quarantined += 1;
                    warn!(
                        content_id = %item.id,
                        failed_attempts = total,
                        "content quarantined after repeated publish failures; \
                         manual intervention required"
                    );
                }
            }
        }
    }
}
