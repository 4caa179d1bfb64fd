//! Configuration System
//!
//! Retry and logging settings, loaded in layers: built-in defaults, an
//! optional TOML file, then `THREADSTATE__`-prefixed environment variables.

use crate::logging::LoggingConfig;
use crate::retry::{backoff, fixed_duration, RetryPolicy, RetryPolicyExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

mod loader;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadstateConfig {
    /// Retry orchestration settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// `backoff_base^(attempt - 1)` milliseconds
    Backoff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Delay for the fixed strategy
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Base for the backoff strategy
    #[serde(default = "default_backoff_base")]
    pub backoff_base: u64,

    /// Retries allowed after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound (exclusive) of random jitter added to each delay; 0 disables
    #[serde(default)]
    pub jitter_ms: u64,
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_backoff_base() -> u64 {
    2
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::default(),
            delay_ms: default_delay_ms(),
            backoff_base: default_backoff_base(),
            max_retries: default_max_retries(),
            jitter_ms: 0,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.strategy == RetryStrategy::Backoff && self.backoff_base < 2 {
            return Err(format!(
                "backoff_base must be at least 2, got {}",
                self.backoff_base
            ));
        }
        Ok(())
    }

    /// Policy described by these settings.
    pub fn build_policy(&self) -> Arc<dyn RetryPolicy> {
        let jitter = Duration::from_millis(self.jitter_ms);
        match self.strategy {
            RetryStrategy::Fixed => Arc::new(
                fixed_duration(Duration::from_millis(self.delay_ms))
                    .with_max_retry_count(self.max_retries)
                    .with_jitter(jitter),
            ),
            RetryStrategy::Backoff => Arc::new(
                backoff(self.backoff_base)
                    .with_max_retry_count(self.max_retries)
                    .with_jitter(jitter),
            ),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Retry(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ThreadstateConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
