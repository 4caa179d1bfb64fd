//! Configuration files driving the retry orchestrator

use config::Environment;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use threadstate::config::{ConfigLoader, RetryStrategy};
use threadstate::error::{ConfigError, TaskError};
use threadstate::executor::TokioPool;
use threadstate::retry::{AsyncRetryExecutor, RetryPolicy};

fn isolated_environment() -> Environment {
    Environment::with_prefix("THREADSTATE")
        .separator("__")
        .source(Some(HashMap::new()))
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("threadstate.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_backoff_config_builds_capped_policy() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[retry]
strategy = "backoff"
backoff_base = 2
max_retries = 4
"#,
    );

    let config = ConfigLoader::new()
        .with_file(&path)
        .with_environment(isolated_environment())
        .load()
        .unwrap();
    assert_eq!(config.retry.strategy, RetryStrategy::Backoff);

    let policy = config.retry.build_policy();
    let waits: Vec<_> = (1..=5).map(|attempt| policy.wait_time(attempt)).collect();
    assert_eq!(
        waits,
        vec![
            Some(Duration::from_millis(1)),
            Some(Duration::from_millis(2)),
            Some(Duration::from_millis(4)),
            Some(Duration::from_millis(8)),
            None,
        ]
    );
}

#[test]
fn test_unknown_strategy_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[retry]\nstrategy = \"sometimes\"\n");

    let result = ConfigLoader::new()
        .with_file(&path)
        .with_environment(isolated_environment())
        .load();

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_invalid_logging_section_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[logging]\noutput = \"syslog\"\n");

    let err = ConfigLoader::new()
        .with_file(&path)
        .with_environment(isolated_environment())
        .load()
        .unwrap_err();

    assert!(err.to_string().contains("Invalid log output: syslog"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_configured_orchestrator_exhausts_budget() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[retry]\ndelay_ms = 1\nmax_retries = 2\njitter_ms = 3\n");
    let config = ConfigLoader::new()
        .with_file(&path)
        .with_environment(isolated_environment())
        .load()
        .unwrap();

    let orchestrator = AsyncRetryExecutor::new(
        Arc::new(TokioPool::current("configured").unwrap()),
        config.retry.build_policy(),
    );

    let err = orchestrator
        .execute(|| -> Result<(), TaskError> { Err(TaskError::failed("unavailable")) })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Exhausted { attempts: 3, .. }));
}
