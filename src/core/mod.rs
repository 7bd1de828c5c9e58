//! Core coordinator types: the snapshot store, the reload coordinator, the
//! source loader, and validation.

mod builder;
mod coordinator;
mod loader;
mod snapshot;
mod validation;

pub use builder::DynamicConfigBuilder;
pub use coordinator::{DynamicConfig, HookPolicy, ReloadFn, ReloadHook, Validator};
pub use loader::ConfigLoader;
pub use snapshot::SnapshotStore;
pub use validation::Validate;
