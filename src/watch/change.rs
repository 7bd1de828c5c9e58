//! The change watcher seam.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Callback a watcher invokes when it observes a change.
///
/// The coordinator passes its `reload` here. Callback errors are logged by
/// the watcher and never abort the watch loop.
pub type ChangeCallback = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// A source of external change notifications.
///
/// Implementations run a long-lived loop in [`watch`](ChangeWatcher::watch)
/// and invoke `on_change` whenever the observed sources change. The loop ends
/// when the shared shutdown signal reads `true` or
/// [`stop`](ChangeWatcher::stop) is called; the two paths are safe to race
/// and neither double-closes underlying OS resources.
///
/// Lifecycle: created once, registered on the coordinator, started exactly
/// once by `start_watching`, stopped via coordinator teardown or an
/// individual `stop` call.
#[async_trait]
pub trait ChangeWatcher: Send + Sync {
    /// Run the watch loop until shutdown or [`stop`](ChangeWatcher::stop).
    async fn watch(&self, shutdown: watch::Receiver<bool>, on_change: ChangeCallback)
    -> Result<()>;

    /// Stop the watch loop and release underlying resources. Idempotent and
    /// safe to call concurrently.
    fn stop(&self) -> Result<()>;
}
