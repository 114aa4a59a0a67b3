//! # Harness Error Types

use std::path::PathBuf;

use thiserror::Error;
use turnstile_core::LockError;

/// Errors that can occur while configuring or running a workload.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The lock reported an error.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The config text is not valid TOML for a stress config.
    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but describes an impossible workload.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker thread panicked.
    #[error("worker thread {0} panicked")]
    WorkerPanicked(String),

    /// The lock was still referenced after every worker joined, so it could
    /// not be destroyed.
    #[error("lock still shared after all workers joined")]
    LockStillShared,
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
