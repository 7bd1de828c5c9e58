//! Feature flags with atomic whole-map replacement.
//!
//! The flag map lives beside the main configuration but updates independently
//! of the reload cycle: flag payloads often arrive from a different channel
//! (a flag file, a remote rollout service) than the application config.

mod store;
mod value;

pub use store::{FeatureFlags, FlagMap};
pub use value::FlagValue;
