//! Priority-ordered configuration source merge.

use crate::error::{ConfigError, Result};
use crate::sources::ConfigSource;
use serde::de::DeserializeOwned;

/// Loads and merges configuration from registered sources.
///
/// Sources merge in priority order, lowest first, so higher-priority sources
/// override overlapping keys. Nested tables are flattened to dotted paths
/// before merging, so a source that sets only `server.port` overrides that
/// one key instead of replacing the whole `server` section. The loader is
/// what the coordinator's reload function wraps: every reload re-reads every
/// source from scratch.
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

/// Flatten nested tables into dotted path/value pairs; scalars and arrays
/// pass through as-is.
fn flatten_into(prefix: String, value: config::Value, out: &mut Vec<(String, config::Value)>) {
    match value.kind {
        config::ValueKind::Table(table) => {
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(path, child, out);
            }
        }
        other => out.push((prefix, config::Value::from(other))),
    }
}

impl ConfigLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a configuration source.
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Load every source, merge by priority, and deserialize into `T`.
    ///
    /// # Errors
    ///
    /// Fails if no sources are registered, any source fails to load, or the
    /// merged result does not deserialize into `T`.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if self.sources.is_empty() {
            return Err(ConfigError::Load(
                "no configuration sources registered".to_string(),
            ));
        }

        let mut ordered: Vec<_> = self.sources.iter().collect();
        ordered.sort_by_key(|source| source.priority());

        let mut builder = config::Config::builder();
        for source in ordered {
            let values = source
                .load()
                .map_err(|err| ConfigError::Load(format!("source '{}': {}", source.name(), err)))?;
            let mut flat = Vec::new();
            for (key, value) in values {
                flatten_into(key, value, &mut flat);
            }
            for (path, value) in flat {
                builder = builder.set_override(&path, value).map_err(|err| {
                    ConfigError::Load(format!("merging source '{}': {}", source.name(), err))
                })?;
            }
        }

        let merged = builder
            .build()
            .map_err(|err| ConfigError::Load(err.to_string()))?;
        merged
            .try_deserialize::<T>()
            .map_err(|err| ConfigError::Deserialize(err.to_string()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
