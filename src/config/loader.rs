//! Layered configuration loading: defaults, optional TOML file, environment.

use super::ThreadstateConfig;
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides, e.g. `THREADSTATE__RETRY__MAX_RETRIES=5`.
pub const ENV_PREFIX: &str = "THREADSTATE";

pub struct ConfigLoader {
    file: Option<PathBuf>,
    environment: Environment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            environment: Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Read this TOML file between the defaults and the environment.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Replace the environment source.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Load from a TOML file plus the process environment.
    pub fn load_from_file(path: &Path) -> Result<ThreadstateConfig, ConfigError> {
        Self::new().with_file(path).load()
    }

    pub fn load(self) -> Result<ThreadstateConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;

        if let Some(path) = &self.file {
            debug!(config_path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        let config: ThreadstateConfig = builder
            .add_source(self.environment)
            .build()?
            .try_deserialize()?;

        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(messages.join("; "))
        })?;

        Ok(config)
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("retry.strategy", "fixed")?
        .set_default("retry.delay_ms", 1000)?
        .set_default("retry.backoff_base", 2)?
        .set_default("retry.max_retries", 3)?
        .set_default("retry.jitter_ms", 0)?
        .set_default("logging.level", "info")?)
}
