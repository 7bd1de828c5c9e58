//! Builder for constructing coordinator instances.

use crate::core::loader::ConfigLoader;
use crate::core::{DynamicConfig, HookPolicy, ReloadHook, Validator};
use crate::error::{ConfigError, Result, ValidationError};
use crate::sources::{ConfigSource, EnvSource, FileSource};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "file-watch")]
use crate::watch::FileWatcher;

/// Fluent construction of a [`DynamicConfig`].
///
/// Accumulates sources, validation, and hooks, performs the initial load on
/// [`build`](DynamicConfigBuilder::build), and wires the loader back in as the
/// coordinator's reload function so later reloads re-read the same sources.
///
/// # Examples
///
/// ```rust,no_run
/// use dynconf::prelude::*;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// # fn example() -> dynconf::error::Result<()> {
/// let config = DynamicConfig::<AppConfig>::builder()
///     .with_file("config/default.yaml")
///     .with_file("config/production.yaml")
///     .with_env_overrides("APP", "__")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DynamicConfigBuilder<T> {
    files: Vec<PathBuf>,
    env: Option<(String, String)>,
    custom_sources: Vec<Box<dyn ConfigSource>>,
    validator: Option<Validator<T>>,
    hooks: Vec<ReloadHook<T>>,
    hook_policy: HookPolicy,
    watch_files: bool,
}

impl<T> DynamicConfigBuilder<T> {
    /// Create a builder with no sources.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            env: None,
            custom_sources: Vec::new(),
            validator: None,
            hooks: Vec::new(),
            hook_policy: HookPolicy::default(),
            watch_files: false,
        }
    }

    /// Add a file source with format auto-detection (`.yaml`, `.yml`,
    /// `.json`, `.toml`). Later files override earlier ones.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add environment variable overrides, e.g. `APP_SERVER__PORT=8080` with
    /// prefix `APP` and separator `__` becomes `server.port`. Environment
    /// variables take precedence over every file source.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env = Some((prefix.to_string(), separator.to_string()));
        self
    }

    /// Add a custom configuration source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Require `validator` to pass before any snapshot installs, including the
    /// initial one.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Register a reload hook, run with `(old, new)` on every reload.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Choose what a failing reload hook does. Defaults to
    /// [`HookPolicy::Tolerate`].
    pub fn with_hook_policy(mut self, policy: HookPolicy) -> Self {
        self.hook_policy = policy;
        self
    }

    /// Automatically register a [`FileWatcher`] over every file source so the
    /// configuration reloads when the files change. Watching itself starts
    /// with [`DynamicConfig::start_watching`].
    #[cfg(feature = "file-watch")]
    pub fn with_file_watch(mut self, enabled: bool) -> Self {
        self.watch_files = enabled;
        self
    }

    /// Perform the initial load and build the coordinator.
    ///
    /// # Errors
    ///
    /// Fails if any source cannot be loaded, the merged result does not
    /// deserialize into `T`, the validator rejects the initial snapshot, or a
    /// file watch cannot be established.
    pub fn build(self) -> Result<DynamicConfig<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let mut loader = ConfigLoader::new();
        for (index, path) in self.files.iter().enumerate() {
            let priority = 100 + index as i32 * 10;
            loader.add_source(Box::new(FileSource::new(path).with_priority(priority)));
        }
        for source in self.custom_sources {
            loader.add_source(source);
        }
        if let Some((prefix, separator)) = &self.env {
            loader.add_source(Box::new(EnvSource::new(prefix.as_str(), separator.as_str())));
        }

        let initial: T = loader.load()?;
        if let Some(validator) = &self.validator {
            validator(&initial).map_err(|err| ConfigError::Validation(err.to_string()))?;
        }

        let config = DynamicConfig::new(initial);
        config.set_hook_policy(self.hook_policy);
        if let Some(validator) = self.validator {
            config.set_validator(move |candidate: &T| validator(candidate));
        }
        for hook in self.hooks {
            config.add_hook(move |old: &T, new: &T| hook(old, new));
        }

        let loader = Arc::new(loader);
        config.set_reload_fn(move || loader.load::<T>());

        #[cfg(feature = "file-watch")]
        if self.watch_files && !self.files.is_empty() {
            config.add_watcher(Arc::new(FileWatcher::new(&self.files)?));
        }

        Ok(config)
    }
}

impl<T> Default for DynamicConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicConfig<T> {
    /// Create a builder for this configuration type.
    pub fn builder() -> DynamicConfigBuilder<T> {
        DynamicConfigBuilder::new()
    }
}
