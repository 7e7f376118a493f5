//! Deferred-publish scheduling for the content platform.
//!
//! Authors schedule content for a future release instant; every service
//! instance runs one background poller that finds due items and publishes
//! them. Instances do not coordinate: any number of them may race on the same
//! item, and correctness rests entirely on the store's conditional write, a
//! publish guarded by the revision token read alongside the item. Whichever
//! writer's token is stale loses and walks away.
//!
//! ## Components
//!
//! - `ScheduledItem` / `VersionToken`: the unit of work and its revision stamp
//! - `ContentStore`: storage port (due-item query, conditional publish,
//!   failure bookkeeping)
//! - `PublishExecutor`: one conditional publish attempt, classified
//! - `RetryPolicy` / `RetryController`: bounded retries with backoff inside
//!   one cycle
//! - `Scheduler`: poller lifecycle, tick loop, per-cycle deadline, quarantine
//!   bookkeeping
//! - `SideEffectDispatcher`: fire-and-forget notifications after a publish
//! - `InMemoryContentStore`: store implementation for tests/dev

pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod item;
pub mod memory;
pub mod poller;
pub mod retry;
pub mod search;
pub mod store;

pub use config::SchedulerConfig;
pub use dispatcher::{DetachedTask, SideEffectDispatcher};
pub use executor::{AttemptOutcome, PublishExecutor};
pub use item::{ScheduledItem, VersionToken};
pub use memory::InMemoryContentStore;
pub use poller::{Scheduler, SchedulerState, SchedulerStats};
pub use retry::{BackoffStrategy, ItemOutcome, RetryController, RetryPolicy};
pub use search::{DisabledSearchNotifier, NotifyError, SearchNotifier};
pub use store::{ContentStore, PublishOutcome, StoreError};
