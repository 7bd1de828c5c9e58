//! Change detection: the watcher seam and the filesystem watcher.

mod change;
mod file;

pub use change::{ChangeCallback, ChangeWatcher};
pub use file::FileWatcher;
