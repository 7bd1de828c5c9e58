//! # dynconf
//!
//! Dynamic configuration engine with lock-free snapshot reads, debounced file
//! watching, and atomic feature flags.
//!
//! ## Overview
//!
//! `dynconf` wires three pieces together:
//! - A generic snapshot store: one atomically-swapped, immutable configuration
//!   value that readers fetch without taking a lock.
//! - A feature flag store built the same way: a whole-map copy-on-write swap
//!   with typed accessors.
//! - A reload coordinator that re-runs a loader when a change watcher fires,
//!   validates the result, runs reload hooks, and installs the new snapshot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynconf::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     port: u16,
//!     database_url: String,
//! }
//!
//! # fn example() -> dynconf::error::Result<()> {
//! let config = DynamicConfig::<AppConfig>::builder()
//!     .with_file("config/default.yaml")
//!     .with_env_overrides("APP", "__")
//!     .build()?;
//!
//! // Lock-free read; the handle stays valid even if a reload lands.
//! let current = config.get();
//! println!("listening on {}", current.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reload semantics
//!
//! A reload is fail-closed: if the loader errors or the validator rejects the
//! candidate, the previous snapshot stays installed and keeps serving. Reload
//! hooks run in registration order with `(old, new)` before installation; a
//! failing hook is logged and tolerated by default, but
//! [`HookPolicy::Abort`](crate::core::HookPolicy) turns hook failures into
//! reload failures.
//!
//! ## Feature Flags
//!
//! The `file-watch` cargo feature (enabled by default) pulls in `notify`,
//! `tokio`, and `async-trait` for the [`watch`] module. Without it the crate
//! still provides the snapshot store, feature flags, loader, and manual
//! reloads.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod flags;
pub mod sources;

#[cfg(feature = "file-watch")]
pub mod watch;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{DynamicConfig, DynamicConfigBuilder, HookPolicy, Validate};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::flags::{FeatureFlags, FlagValue};

    #[cfg(feature = "file-watch")]
    pub use crate::watch::{ChangeWatcher, FileWatcher};
}
