//! Environment variable configuration source.

use super::ConfigSource;
use crate::error::{ConfigError, Result};
use std::collections::HashMap;

/// Loads configuration overrides from prefixed environment variables.
///
/// With prefix `APP` and separator `__`, the variable `APP_SERVER__PORT=8080`
/// contributes `server.port = 8080`. Values are parsed into numbers and
/// booleans where possible.
pub struct EnvSource {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvSource {
    /// Create an environment source. Environment variables override file
    /// sources by default (priority 300).
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Override the merge priority (default 300).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let parsed = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(&self.prefix)
                    .separator(&self.separator)
                    .try_parsing(true),
            )
            .build()
            .map_err(|err| {
                ConfigError::Load(format!("environment prefix '{}': {}", self.prefix, err))
            })?;

        parsed
            .try_deserialize()
            .map_err(|err| ConfigError::Deserialize(err.to_string()))
    }

    fn name(&self) -> String {
        format!("env:{}", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
