//! Bridge configuration via `cbridge.toml`
//!
//! A handle's execution strategy and worker thread parameters are chosen per
//! handle from a [`BridgeConfig`]. The same binary can run both strategies
//! side by side; nothing is decided at build time.

use std::path::Path;

use cbridge_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "cbridge.toml";

/// Default name given to worker threads.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "cbridge-worker";

/// How a handle executes its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One dedicated worker thread per handle draining a FIFO queue.
    /// Results are delivered to the issuer's mailbox.
    QueueWorker,
    /// Each task runs on the async runtime's blocking pool.
    /// Results are returned through a [`Completion`](crate::Completion).
    DirtyOffload,
}

impl ExecutionStrategy {
    /// Name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStrategy::QueueWorker => "worker",
            ExecutionStrategy::DirtyOffload => "dirty",
        }
    }
}

/// Handle configuration loaded from `cbridge.toml`.
///
/// # Example
///
/// ```toml
/// # "worker" (default) or "dirty"
/// strategy = "worker"
/// worker_thread_name = "cbridge-worker"
/// # worker_stack_size = 262144
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Execution strategy: `"worker"` or `"dirty"`.
    #[serde(default = "default_strategy_str")]
    pub strategy: String,
    /// Name given to the worker thread.
    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,
    /// Worker thread stack size in bytes; platform default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_stack_size: Option<usize>,
}

fn default_strategy_str() -> String {
    ExecutionStrategy::QueueWorker.as_str().to_string()
}

fn default_worker_thread_name() -> String {
    DEFAULT_WORKER_THREAD_NAME.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy_str(),
            worker_thread_name: default_worker_thread_name(),
            worker_stack_size: None,
        }
    }
}

impl BridgeConfig {
    /// Default config using the worker strategy.
    pub fn worker() -> Self {
        Self::default()
    }

    /// Default config using the dirty offload strategy.
    pub fn dirty() -> Self {
        Self {
            strategy: ExecutionStrategy::DirtyOffload.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Parse the strategy string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the string is not `"worker"` or `"dirty"`.
    pub fn execution_strategy(&self) -> Result<ExecutionStrategy> {
        match self.strategy.as_str() {
            "worker" => Ok(ExecutionStrategy::QueueWorker),
            "dirty" => Ok(ExecutionStrategy::DirtyOffload),
            other => Err(Error::InvalidConfig {
                reason: format!(
                    "unknown strategy '{}' in {}, expected \"worker\" or \"dirty\"",
                    other, CONFIG_FILE_NAME
                ),
            }),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        self.execution_strategy()?;
        if self.worker_thread_name.contains('\0') {
            return Err(Error::InvalidConfig {
                reason: "worker_thread_name must not contain NUL".to_string(),
            });
        }
        if self.worker_stack_size == Some(0) {
            return Err(Error::InvalidConfig {
                reason: "worker_stack_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# cbridge handle configuration
#
# Execution strategy: "worker" (default) or "dirty"
#   "worker" = one dedicated thread per handle, FIFO, results sent to the issuer
#   "dirty"  = tasks run on the async runtime's blocking pool, results
#              returned through a completion future
strategy = "worker"

# Name given to the worker thread (worker strategy only)
worker_thread_name = "cbridge-worker"

# Worker thread stack size in bytes (optional, platform default)
# worker_stack_size = 262144
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::InvalidConfig {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        let config: BridgeConfig = toml::from_str(&content).map_err(|e| Error::InvalidConfig {
            reason: format!("failed to parse config file '{}': {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| Error::InvalidConfig {
                reason: format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ),
            })?;
        }
        Ok(())
    }
}
