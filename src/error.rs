//! Error types
//!
//! Simulation conditions (terminal health, degraded parallelism, tiny
//! distances) are never errors. Only the worker pool and configuration
//! loading can fail.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the [`crate::scheduler::TaskScheduler`]
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Not a single worker thread could be started
    #[error("failed to spawn any worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// One or more tasks panicked since the previous barrier
    #[error("{count} task(s) panicked during the last batch")]
    TaskPanicked { count: usize },
}

/// Errors raised while loading [`crate::Settings`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
