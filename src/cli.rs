//! CLI for the demo binary: argument parsing and command execution.

use crate::concurrent::merge;
use crate::config::{ConfigLoader, ThreadstateConfig};
use crate::context::{ContextDecorator, DiagnosticContext, DiagnosticContextSource};
use crate::error::TaskError;
use crate::executor::{DelegatedExecutorService, ExecutorServiceExt, ScheduledExecutor, TokioPool};
use crate::retry::AsyncRetryExecutor;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Key under which the demo stores its correlation id.
pub const CORRELATION_KEY: &str = "correlation_id";

#[derive(Parser)]
#[command(name = "threadstate")]
#[command(about = "Context propagation and async retry demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit tasks through a context-propagating pool
    Propagate {
        /// Number of tasks to submit
        #[arg(long, default_value_t = 4)]
        tasks: usize,

        /// Correlation id placed in the diagnostic context before submitting
        #[arg(long, default_value = "demo-request")]
        correlation_id: String,
    },
    /// Run flaky work through the retry orchestrator
    Retry {
        /// Number of calls that fail before the work succeeds
        #[arg(long, default_value_t = 2)]
        failures: u32,
    },
}

/// Loaded configuration plus the runtime the commands run on.
pub struct RunContext {
    config: ThreadstateConfig,
    runtime: Runtime,
}

impl RunContext {
    pub fn new(config: ThreadstateConfig) -> anyhow::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("threadstate-worker")
            .build()
            .context("Failed to start runtime")?;
        Ok(Self { config, runtime })
    }

    /// Load configuration from `config_path` (if any) and the environment.
    pub fn load(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = config_path {
            loader = loader.with_file(path);
        }
        Self::new(loader.load()?)
    }

    pub fn config(&self) -> &ThreadstateConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Propagate {
                tasks,
                correlation_id,
            } => self.propagate(*tasks, correlation_id),
            Commands::Retry { failures } => self.retry(*failures),
        }
    }

    fn propagate(&self, tasks: usize, correlation_id: &str) -> anyhow::Result<String> {
        let pool = TokioPool::new(self.runtime.handle().clone(), "propagate");
        let executor = DelegatedExecutorService::new(
            pool,
            Arc::new(ContextDecorator::new(DiagnosticContextSource::new())),
        );

        DiagnosticContext::put(CORRELATION_KEY, correlation_id);
        let submitted = (0..tasks)
            .map(|index| {
                DiagnosticContext::put("task", index.to_string());
                executor.submit(move || {
                    let observed = DiagnosticContext::render();
                    debug!(task = index, context = %observed, "Task running");
                    Ok(format!("task {} saw [{}]", index, observed))
                })
            })
            .collect::<Result<Vec<_>, TaskError>>();
        DiagnosticContext::clear();

        let lines = self.runtime.block_on(merge(submitted?))?;
        info!(tasks, "All tasks completed");
        Ok(lines.join("\n"))
    }

    fn retry(&self, failures: u32) -> anyhow::Result<String> {
        let pool: Arc<dyn ScheduledExecutor> =
            Arc::new(TokioPool::new(self.runtime.handle().clone(), "retry"));
        let orchestrator = AsyncRetryExecutor::new(pool, self.config.retry.build_policy());

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let handle = orchestrator.execute(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= failures {
                return Err(TaskError::failed(format!("simulated failure {}", call)));
            }
            Ok(call)
        });

        let output = match self.runtime.block_on(handle) {
            Ok(call) => format!("Succeeded on call {}", call),
            Err(e) => format!(
                "Gave up after {} calls: {}",
                calls.load(Ordering::SeqCst),
                e
            ),
        };
        Ok(output)
    }
}
