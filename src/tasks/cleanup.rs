//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{Cache, Table};

// == Sweeper Handle ==
/// Handle to a running cleanup task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the task to stop. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Returns true once [`stop`](Self::stop) has been called or the handle is
    /// being dropped.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawns a task on the current Tokio runtime that runs [`Cache::cleanup`]
/// every `interval`.
///
/// The task runs a sweep first and then sleeps, until the returned handle is
/// stopped or dropped, or until the cache itself is dropped. It shares the
/// cache's lock with foreground operations.
///
/// # Panics
/// Panics if called outside a Tokio runtime or if `interval` is zero. Prefer
/// [`CacheBuilder::cleanup`](crate::CacheBuilder::cleanup), which reports both
/// as errors.
///
/// # Example
/// ```ignore
/// let cache = Cache::<String>::new();
/// let sweeper = spawn_sweeper(&cache, Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.stop();
/// ```
pub fn spawn_sweeper<V>(cache: &Cache<V>, interval: Duration) -> SweeperHandle
where
    V: Send + Sync + 'static,
{
    assert!(!interval.is_zero(), "cleanup interval must be greater than zero");
    spawn_sweeper_on(&Handle::current(), cache.table(), interval)
}

pub(crate) fn spawn_sweeper_on<V>(
    runtime: &Handle,
    table: &Arc<Table<V>>,
    interval: Duration,
) -> SweeperHandle
where
    V: Send + Sync + 'static,
{
    let token = CancellationToken::new();
    let task = runtime.spawn(run_sweeper(Arc::downgrade(table), interval, token.clone()));

    SweeperHandle { token, task }
}

async fn run_sweeper<V>(table: Weak<Table<V>>, interval: Duration, token: CancellationToken) {
    info!(
        "Starting TTL cleanup task with interval of {} ms",
        interval.as_millis()
    );

    loop {
        let Some(table) = table.upgrade() else {
            debug!("Cache dropped, stopping TTL cleanup task");
            return;
        };
        let removed = table.cleanup();
        drop(table);

        if removed > 0 {
            info!("TTL cleanup: removed {} expired entries", removed);
        } else {
            debug!("TTL cleanup: no expired entries found");
        }

        tokio::select! {
            _ = token.cancelled() => {
                debug!("TTL cleanup task stopped");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
