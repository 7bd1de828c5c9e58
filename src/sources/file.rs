//! File-based configuration source.

use super::ConfigSource;
use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Loads configuration from a YAML, TOML, or JSON file, with the format
/// detected from the extension.
pub struct FileSource {
    path: PathBuf,
    priority: i32,
}

impl FileSource {
    /// Create a file source for `path`. Recognized extensions: `.yaml`,
    /// `.yml`, `.json`, `.toml`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
        }
    }

    /// Override the merge priority (default 100).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn check_extension(&self) -> Result<()> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        match extension {
            "yaml" | "yml" | "json" | "toml" => Ok(()),
            _ => Err(ConfigError::Load(format!(
                "unsupported config extension '{}' for {} (expected .yaml, .yml, .json, or .toml)",
                extension,
                self.path.display()
            ))),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        self.check_extension()?;
        if !self.path.exists() {
            return Err(ConfigError::Load(format!(
                "configuration file not found: {}",
                self.path.display()
            )));
        }

        let parsed = config::Config::builder()
            .add_source(config::File::from(self.path.clone()).required(true))
            .build()
            .map_err(|err| ConfigError::Load(format!("{}: {}", self.path.display(), err)))?;

        parsed
            .try_deserialize()
            .map_err(|err| ConfigError::Deserialize(format!("{}: {}", self.path.display(), err)))
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
