//! Configuration source trait.

use crate::error::Result;
use std::collections::HashMap;

/// A single place configuration can come from.
///
/// Sources produce a flat key/value map that the loader merges in priority
/// order. Implement this to feed configuration from anywhere the built-in
/// file and environment sources don't cover.
pub trait ConfigSource: Send + Sync {
    /// Load this source's key/value contributions.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    fn load(&self) -> Result<HashMap<String, config::Value>>;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> String;

    /// Merge priority; higher values override lower ones.
    ///
    /// Defaults used by the builder: file sources start at 100 and step by
    /// 10 per file, environment variables sit at 300.
    fn priority(&self) -> i32 {
        100
    }
}
