//! Atomic feature flag storage.

use super::FlagValue;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// The flag map type stored and returned by [`FeatureFlags`].
pub type FlagMap = HashMap<String, FlagValue>;

/// Concurrent feature flag store.
///
/// The published flag map is immutable: every update builds a new map and
/// atomically swaps the reference, so readers observe either the before or
/// the after map in full, never a partial write. The internal mutex
/// serializes writers only; reads never lock.
///
/// # Examples
///
/// ```rust
/// use dynconf::flags::FeatureFlags;
///
/// let flags = FeatureFlags::new();
/// flags.set("new_checkout", true);
/// assert!(flags.is_enabled("new_checkout"));
/// assert!(!flags.is_enabled("unknown"));
/// ```
pub struct FeatureFlags {
    current: ArcSwap<FlagMap>,
    write: Mutex<()>,
}

impl FeatureFlags {
    /// Create an empty flag store.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(FlagMap::new()),
            write: Mutex::new(()),
        }
    }

    /// Look up a single flag.
    pub fn get(&self, key: &str) -> Option<FlagValue> {
        self.current.load().get(key).cloned()
    }

    /// Boolean accessor; `false` for absent keys. See
    /// [`FlagValue::as_bool`] for the exact coercion rule.
    pub fn get_bool(&self, key: &str) -> bool {
        self.current
            .load()
            .get(key)
            .map(FlagValue::as_bool)
            .unwrap_or(false)
    }

    /// String accessor; `""` for absent keys, otherwise the value's default
    /// string representation.
    pub fn get_string(&self, key: &str) -> String {
        self.current
            .load()
            .get(key)
            .map(FlagValue::as_string)
            .unwrap_or_default()
    }

    /// Integer accessor; `0` for absent keys. See [`FlagValue::as_int`] for
    /// the coercion rule, including its silent parse-failure behavior.
    pub fn get_int(&self, key: &str) -> i64 {
        self.current
            .load()
            .get(key)
            .map(FlagValue::as_int)
            .unwrap_or(0)
    }

    /// Alias for [`get_bool`](FeatureFlags::get_bool).
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get_bool(key)
    }

    /// Insert or replace one flag by publishing a new map.
    pub fn set(&self, key: impl Into<String>, value: impl Into<FlagValue>) {
        let key = key.into();
        let value = value.into();

        let _guard = self.write.lock();
        let mut next = self.current.load_full().as_ref().clone();
        debug!(flag = %key, "feature flag updated");
        next.insert(key, value);
        self.current.store(Arc::new(next));
    }

    /// Replace the entire flag set atomically. `None` is normalized to an
    /// empty set.
    pub fn set_all(&self, flags: Option<FlagMap>) {
        let next = flags.unwrap_or_default();
        info!(count = next.len(), "feature flag set replaced");

        let _guard = self.write.lock();
        self.current.store(Arc::new(next));
    }

    /// Defensive copy of the current flag map; mutating the result never
    /// affects the store.
    pub fn get_all(&self) -> FlagMap {
        self.current.load_full().as_ref().clone()
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}
