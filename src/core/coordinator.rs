//! The dynamic configuration coordinator.

use crate::core::SnapshotStore;
use crate::error::{ConfigError, Result, ValidationError};
use crate::flags::FeatureFlags;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{error, info, warn};

#[cfg(feature = "file-watch")]
use crate::watch::{ChangeCallback, ChangeWatcher};
#[cfg(feature = "file-watch")]
use tokio::sync::watch;

/// Function invoked on every reload to produce a fresh snapshot.
///
/// Typically "re-parse and re-validate the configuration files". The
/// coordinator serializes invocations, so the function only needs to be safe
/// to call repeatedly, one call at a time.
pub type ReloadFn<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// Validator run against every candidate snapshot before installation.
pub type Validator<T> =
    Arc<dyn Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Hook invoked with `(old, new)` during a reload, before the new snapshot is
/// installed. Hooks are notifications, not gatekeepers; see [`HookPolicy`].
pub type ReloadHook<T> = Arc<dyn Fn(&T, &T) -> Result<()> + Send + Sync>;

/// What a failing reload hook does to the reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookPolicy {
    /// Log the failure as a warning and install the new snapshot anyway.
    #[default]
    Tolerate,
    /// Abort the reload; the previous snapshot stays installed.
    Abort,
}

const STATE_CONSTRUCTED: u8 = 0;
const STATE_WATCHING: u8 = 1;
const STATE_STOPPED: u8 = 2;

struct Shared<T> {
    store: SnapshotStore<T>,
    flags: FeatureFlags,
    reload_fn: Mutex<Option<ReloadFn<T>>>,
    validator: Mutex<Option<Validator<T>>>,
    hooks: Mutex<Vec<ReloadHook<T>>>,
    hook_policy: Mutex<HookPolicy>,
    /// Serializes the whole compute-validate-hook-install sequence so hook
    /// execution order matches installation order and the `old` a hook sees is
    /// always the value immediately preceding `new`.
    reload_lock: Mutex<()>,
    state: AtomicU8,
    #[cfg(feature = "file-watch")]
    watchers: Mutex<Vec<Arc<dyn ChangeWatcher>>>,
}

/// Coordinates the snapshot store, the reload function, change watchers, and
/// reload hooks.
///
/// Lifecycle: constructed, then watching (after [`start_watching`]), then
/// stopped (after [`stop`]); there is no way back from stopped. Reads via
/// [`get`] work in every state.
///
/// Cloning is cheap and every clone addresses the same underlying state, so a
/// coordinator can be handed to watcher tasks and request handlers alike.
///
/// # Examples
///
/// ```rust
/// use dynconf::core::DynamicConfig;
///
/// #[derive(Debug)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let config = DynamicConfig::new(AppConfig { port: 8080 });
/// config.set_reload_fn(|| Ok(AppConfig { port: 9090 }));
/// config.reload().unwrap();
/// assert_eq!(config.get().port, 9090);
/// ```
///
/// [`start_watching`]: DynamicConfig::start_watching
/// [`stop`]: DynamicConfig::stop
/// [`get`]: DynamicConfig::get
pub struct DynamicConfig<T> {
    shared: Arc<Shared<T>>,
}

impl<T> DynamicConfig<T> {
    /// Create a coordinator around an initial snapshot.
    ///
    /// The snapshot store is never empty after this; the last-reload timestamp
    /// starts at construction time.
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: SnapshotStore::new(initial),
                flags: FeatureFlags::new(),
                reload_fn: Mutex::new(None),
                validator: Mutex::new(None),
                hooks: Mutex::new(Vec::new()),
                hook_policy: Mutex::new(HookPolicy::default()),
                reload_lock: Mutex::new(()),
                state: AtomicU8::new(STATE_CONSTRUCTED),
                #[cfg(feature = "file-watch")]
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The current snapshot. Lock-free, available in every lifecycle state.
    pub fn get(&self) -> Arc<T> {
        self.shared.store.get()
    }

    /// Wall-clock time of the most recent successful installation, including
    /// the initial one.
    pub fn last_reload(&self) -> DateTime<Utc> {
        self.shared.store.last_reload()
    }

    /// The coordinator-owned feature flag store.
    pub fn flags(&self) -> &FeatureFlags {
        &self.shared.flags
    }

    /// Register the function invoked on every reload. Last write wins; it must
    /// be registered before the first reload to have any effect.
    pub fn set_reload_fn<F>(&self, reload_fn: F)
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        *self.shared.reload_fn.lock() = Some(Arc::new(reload_fn));
    }

    /// Register a validator run against every candidate snapshot (reloaded or
    /// directly updated) before installation.
    pub fn set_validator<F>(&self, validator: F)
    where
        F: Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        *self.shared.validator.lock() = Some(Arc::new(validator));
    }

    /// Choose what a failing reload hook does. Defaults to
    /// [`HookPolicy::Tolerate`].
    pub fn set_hook_policy(&self, policy: HookPolicy) {
        *self.shared.hook_policy.lock() = policy;
    }

    /// Append a reload hook. Hooks run in registration order with
    /// `(old, new)` before the new snapshot is installed.
    pub fn add_hook<F>(&self, hook: F)
    where
        F: Fn(&T, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.shared.hooks.lock().push(Arc::new(hook));
    }

    /// Re-run the reload function, validate the result, run hooks, and install
    /// the new snapshot.
    ///
    /// Fail-closed: if the reload function errors or the validator rejects the
    /// candidate, the error is logged and returned and the previous snapshot
    /// keeps serving. With no reload function registered this is a no-op
    /// returning success.
    ///
    /// Concurrent calls are serialized; readers are never blocked.
    pub fn reload(&self) -> Result<()> {
        let Some(reload_fn) = self.shared.reload_fn.lock().clone() else {
            return Ok(());
        };

        let _write = self.shared.reload_lock.lock();
        let old = self.shared.store.get();

        let new = match reload_fn() {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "reload failed, keeping current snapshot");
                return Err(err);
            }
        };

        if let Some(validator) = self.shared.validator.lock().clone() {
            if let Err(err) = validator(&new) {
                error!(error = %err, "reloaded configuration rejected by validator");
                return Err(ConfigError::Validation(err.to_string()));
            }
        }

        let new = Arc::new(new);
        self.run_hooks(&old, &new)?;
        self.shared.store.store(Arc::clone(&new));
        info!("configuration reloaded");
        Ok(())
    }

    /// Install a snapshot directly, bypassing the reload function. The
    /// validator and hooks still run.
    pub fn update(&self, new: T) -> Result<()> {
        let _write = self.shared.reload_lock.lock();
        let old = self.shared.store.get();

        if let Some(validator) = self.shared.validator.lock().clone() {
            if let Err(err) = validator(&new) {
                return Err(ConfigError::Validation(err.to_string()));
            }
        }

        let new = Arc::new(new);
        self.run_hooks(&old, &new)?;
        self.shared.store.store(new);
        Ok(())
    }

    fn run_hooks(&self, old: &Arc<T>, new: &Arc<T>) -> Result<()> {
        let hooks = self.shared.hooks.lock().clone();
        let policy = *self.shared.hook_policy.lock();
        for (index, hook) in hooks.iter().enumerate() {
            if let Err(err) = hook(old.as_ref(), new.as_ref()) {
                match policy {
                    HookPolicy::Tolerate => {
                        warn!(hook = index, error = %err, "reload hook failed; installing snapshot anyway");
                    }
                    HookPolicy::Abort => {
                        return Err(ConfigError::Hook {
                            index,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "file-watch")]
impl<T: Send + Sync + 'static> DynamicConfig<T> {
    /// Register a change watcher. Append-only; register watchers before
    /// calling [`start_watching`](DynamicConfig::start_watching).
    pub fn add_watcher(&self, watcher: Arc<dyn ChangeWatcher>) {
        self.shared.watchers.lock().push(watcher);
    }

    /// Snapshot the watcher list and launch every watcher on its own task,
    /// each invoking [`reload`](DynamicConfig::reload) as its change callback.
    ///
    /// Returns immediately after launching. Watcher errors are logged, not
    /// propagated. The shared `shutdown` signal cancels all watcher loops when
    /// its value becomes `true`.
    pub fn start_watching(&self, shutdown: watch::Receiver<bool>) {
        let startable = self.shared.state.compare_exchange(
            STATE_CONSTRUCTED,
            STATE_WATCHING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if startable.is_err() {
            warn!("start_watching called after watching started or stopped; ignoring");
            return;
        }

        let watchers = self.shared.watchers.lock().clone();
        for (index, watcher) in watchers.into_iter().enumerate() {
            let on_change: ChangeCallback = {
                let coordinator = self.clone();
                Arc::new(move || coordinator.reload())
            };
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if let Err(err) = watcher.watch(shutdown, on_change).await {
                    error!(watcher = index, error = %err, "watcher terminated with error");
                }
            });
        }
    }

    /// Stop every registered watcher and move to the stopped state.
    ///
    /// Idempotent. Returns only the first stop error encountered; the rest
    /// are logged. This lossy aggregation is deliberate.
    pub fn stop(&self) -> Result<()> {
        self.shared.state.store(STATE_STOPPED, Ordering::SeqCst);

        let watchers = self.shared.watchers.lock().clone();
        let mut first_error = None;
        for (index, watcher) in watchers.iter().enumerate() {
            if let Err(err) = watcher.stop() {
                warn!(watcher = index, error = %err, "watcher stop failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<T> Clone for DynamicConfig<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestConfig {
        port: u16,
    }

    #[test]
    fn reload_without_reload_fn_is_a_noop() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        assert!(config.reload().is_ok());
        assert_eq!(config.get().port, 8080);
    }

    #[test]
    fn reload_installs_new_snapshot_and_advances_timestamp() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        let before = config.last_reload();

        config.set_reload_fn(|| Ok(TestConfig { port: 9090 }));
        config.reload().unwrap();

        assert_eq!(config.get().port, 9090);
        assert!(config.last_reload() >= before);
    }

    #[test]
    fn failed_reload_keeps_old_snapshot() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        let before = config.get();

        config.set_reload_fn(|| Err(ConfigError::Load("boom".to_string())));
        assert!(config.reload().is_err());

        // Same installation, not just an equal value.
        assert!(Arc::ptr_eq(&before, &config.get()));
    }

    #[test]
    fn validator_rejection_keeps_old_snapshot() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        config.set_validator(|candidate: &TestConfig| {
            if candidate.port < 1024 {
                return Err(ValidationError::invalid_field("port", "must be >= 1024"));
            }
            Ok(())
        });
        config.set_reload_fn(|| Ok(TestConfig { port: 80 }));

        let result = config.reload();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(config.get().port, 8080);
    }

    #[test]
    fn hook_failure_is_tolerated_by_default() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        config.add_hook(|_, _| Err(ConfigError::Load("hook exploded".to_string())));
        config.set_reload_fn(|| Ok(TestConfig { port: 9090 }));

        config.reload().unwrap();
        assert_eq!(config.get().port, 9090);
    }

    #[test]
    fn hook_failure_aborts_under_abort_policy() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        config.set_hook_policy(HookPolicy::Abort);
        config.add_hook(|_, _| Err(ConfigError::Load("hook exploded".to_string())));
        config.set_reload_fn(|| Ok(TestConfig { port: 9090 }));

        let result = config.reload();
        assert!(matches!(result, Err(ConfigError::Hook { index: 0, .. })));
        assert_eq!(config.get().port, 8080);
    }

    #[test]
    fn hooks_observe_old_and_new_in_order() {
        use std::sync::Mutex as StdMutex;

        let observed = Arc::new(StdMutex::new(Vec::new()));
        let config = DynamicConfig::new(TestConfig { port: 1 });

        for tag in ["first", "second"] {
            let observed = Arc::clone(&observed);
            config.add_hook(move |old: &TestConfig, new: &TestConfig| {
                observed.lock().unwrap().push((tag, old.port, new.port));
                Ok(())
            });
        }

        config.set_reload_fn(|| Ok(TestConfig { port: 2 }));
        config.reload().unwrap();

        let calls = observed.lock().unwrap().clone();
        assert_eq!(calls, vec![("first", 1, 2), ("second", 1, 2)]);
    }

    #[test]
    fn update_runs_validator() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        config.set_validator(|candidate: &TestConfig| {
            if candidate.port == 0 {
                return Err(ValidationError::custom("port must be nonzero"));
            }
            Ok(())
        });

        assert!(config.update(TestConfig { port: 0 }).is_err());
        assert_eq!(config.get().port, 8080);

        config.update(TestConfig { port: 9090 }).unwrap();
        assert_eq!(config.get().port, 9090);
    }

    #[test]
    fn clones_share_state() {
        let config = DynamicConfig::new(TestConfig { port: 8080 });
        let clone = config.clone();

        config.update(TestConfig { port: 9090 }).unwrap();
        assert_eq!(clone.get().port, 9090);
    }

    #[test]
    fn serialized_reloads_interleave_cleanly() {
        use std::sync::atomic::AtomicU16;

        let counter = Arc::new(AtomicU16::new(0));
        let config = Arc::new(DynamicConfig::new(TestConfig { port: 0 }));
        {
            let counter = Arc::clone(&counter);
            config.set_reload_fn(move || {
                let port = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(TestConfig { port })
            });
        }

        // Each hook invocation must see old == new - 1: installs are serialized.
        config.add_hook(|old: &TestConfig, new: &TestConfig| {
            assert_eq!(old.port + 1, new.port);
            Ok(())
        });

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let config = Arc::clone(&config);
                std::thread::spawn(move || config.reload().unwrap())
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(config.get().port, 8);
    }
}
