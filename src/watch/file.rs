//! Filesystem-backed change watching with debounce.

use crate::error::{ConfigError, Result};
use crate::watch::{ChangeCallback, ChangeWatcher};
use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, warn};

/// Quiet period a burst of file events must satisfy before it collapses into
/// a single change notification. Every qualifying event re-arms the timer.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Extra delay after the debounce window closes, letting the writer finish
/// flushing the file before it is re-read.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Extensions recognized as configuration files. Events on other paths are
/// observed and ignored.
const CONFIG_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext))
}

/// Watches a fixed set of filesystem paths for configuration changes.
///
/// Write/create events on recognized config files are debounced: a burst of
/// rapid events produces exactly one `on_change` invocation once the burst
/// has been quiet for the debounce window, plus a short settle delay.
///
/// Construction registers every path up front and fails whole if any
/// registration fails; dropping the partially-built OS watcher unregisters
/// whatever had already been added.
pub struct FileWatcher {
    /// Taken exactly once on stop so the OS watch is never double-closed.
    watcher: Mutex<Option<RecommendedWatcher>>,
    /// Taken by the watch loop; a second `watch` call finds it empty.
    events: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    debounce: Duration,
    settle: Duration,
    stopped: AtomicBool,
    stop_signal: Notify,
}

impl FileWatcher {
    /// Watch `paths` with the default 500ms debounce window and 100ms settle
    /// delay.
    ///
    /// # Errors
    ///
    /// Fails if the OS watcher cannot be created or any path cannot be
    /// resolved and registered.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Result<Self> {
        Self::with_debounce(paths, DEBOUNCE_WINDOW, SETTLE_DELAY)
    }

    /// Watch `paths` with explicit debounce and settle durations.
    pub fn with_debounce(
        paths: impl IntoIterator<Item = impl Into<PathBuf>>,
        debounce: Duration,
        settle: Duration,
    ) -> Result<Self> {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(ConfigError::Watch("no paths to watch".to_string()));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event)
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) =>
                {
                    let _ = event_tx.send(event);
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "file watch backend error"),
            }
        })
        .map_err(|err| ConfigError::Watch(format!("failed to create watcher: {}", err)))?;

        for path in &paths {
            let canonical = path.canonicalize().map_err(|err| {
                ConfigError::Watch(format!("cannot resolve {}: {}", path.display(), err))
            })?;
            // An error here drops `watcher`, which unregisters every path
            // added so far.
            watcher
                .watch(&canonical, RecursiveMode::NonRecursive)
                .map_err(|err| {
                    ConfigError::Watch(format!("cannot watch {}: {}", canonical.display(), err))
                })?;
        }

        Ok(Self {
            watcher: Mutex::new(Some(watcher)),
            events: Mutex::new(Some(event_rx)),
            debounce,
            settle,
            stopped: AtomicBool::new(false),
            stop_signal: Notify::new(),
        })
    }
}

#[async_trait]
impl ChangeWatcher for FileWatcher {
    async fn watch(
        &self,
        mut shutdown: watch::Receiver<bool>,
        on_change: ChangeCallback,
    ) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .take()
            .ok_or_else(|| ConfigError::Watch("watch loop already started".to_string()))?;

        // Deadline of the currently-armed debounce window, if any.
        let mut pending: Option<Instant> = None;
        let mut shutdown_live = true;

        loop {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            let deadline =
                pending.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if event.paths.iter().any(|path| is_config_file(path)) {
                            pending = Some(Instant::now() + self.debounce);
                        } else {
                            debug!(paths = ?event.paths, "ignoring event on non-config file");
                        }
                    }
                    // Sender gone: the OS watcher was closed by stop().
                    None => break,
                },
                _ = sleep_until(deadline), if pending.is_some() => {
                    pending = None;
                    sleep(self.settle).await;
                    if let Err(err) = on_change() {
                        warn!(error = %err, "change callback failed; continuing to watch");
                    }
                },
                changed = shutdown.changed(), if shutdown_live => match changed {
                    Ok(()) => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                    // Sender dropped without cancelling: stop() remains the
                    // only cancellation path.
                    Err(_) => shutdown_live = false,
                },
                _ = self.stop_signal.notified() => break,
            }
        }

        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Dropping the handle closes every OS watch exactly once.
        self.watcher.lock().take();
        self.stop_signal.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn counting_callback() -> (ChangeCallback, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let callback = {
            let counter = Arc::clone(&counter);
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as ChangeCallback
        };
        (callback, counter)
    }

    #[test]
    fn extension_filter_matches_config_formats() {
        assert!(is_config_file(Path::new("/etc/app/config.yaml")));
        assert!(is_config_file(Path::new("config.yml")));
        assert!(is_config_file(Path::new("config.json")));
        assert!(is_config_file(Path::new("config.toml")));
        assert!(!is_config_file(Path::new("config.txt")));
        assert!(!is_config_file(Path::new("config")));
        assert!(!is_config_file(Path::new(".yaml")));
    }

    #[test]
    fn construction_fails_for_missing_path() {
        let result = FileWatcher::new(["/nonexistent/config.yaml"]);
        assert!(matches!(result, Err(ConfigError::Watch(_))));
    }

    #[test]
    fn construction_fails_for_empty_path_list() {
        let result = FileWatcher::new(Vec::<PathBuf>::new());
        assert!(matches!(result, Err(ConfigError::Watch(_))));
    }

    #[test]
    fn stop_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "port: 8080").unwrap();

        let watcher = FileWatcher::new([&path]).unwrap();
        watcher.stop().unwrap();
        watcher.stop().unwrap();
        watcher.stop().unwrap();
    }

    #[tokio::test]
    async fn burst_of_writes_collapses_to_one_callback() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "port: 8080").unwrap();

        let watcher = Arc::new(
            FileWatcher::with_debounce(
                [&path],
                Duration::from_millis(200),
                Duration::from_millis(10),
            )
            .unwrap(),
        );
        let (callback, counter) = counting_callback();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.watch(shutdown_rx, callback).await })
        };

        // Burst of writes well inside the debounce window.
        for i in 0..5 {
            fs::write(&path, format!("port: {}", 9000 + i)).unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // Wait out the window, the settle delay, and some slack.
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        watcher.stop().unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn non_config_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        fs::write(&config_path, "port: 8080").unwrap();

        // Watch the directory so sibling files produce events too.
        let watcher = Arc::new(
            FileWatcher::with_debounce(
                [temp.path()],
                Duration::from_millis(100),
                Duration::from_millis(10),
            )
            .unwrap(),
        );
        let (callback, counter) = counting_callback();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.watch(shutdown_rx, callback).await })
        };

        fs::write(temp.path().join("notes.txt"), "not config").unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        fs::write(&config_path, "port: 9090").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        watcher.stop().unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shared_shutdown_signal_ends_the_loop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "port: 8080").unwrap();

        let watcher = Arc::new(FileWatcher::new([&path]).unwrap());
        let (callback, _counter) = counting_callback();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.watch(shutdown_rx, callback).await })
        };

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("watch loop should end on shutdown")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn second_watch_call_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "port: 8080").unwrap();

        let watcher = Arc::new(FileWatcher::new([&path]).unwrap());
        let (callback, _counter) = counting_callback();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let watcher = Arc::clone(&watcher);
            let shutdown_rx = shutdown_rx.clone();
            let callback = Arc::clone(&callback);
            tokio::spawn(async move { watcher.watch(shutdown_rx, callback).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = watcher.watch(shutdown_rx, callback).await;
        assert!(matches!(second, Err(ConfigError::Watch(_))));

        watcher.stop().unwrap();
        task.await.unwrap().unwrap();
    }
}
