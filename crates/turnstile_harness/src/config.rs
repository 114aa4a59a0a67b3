//! # Stress Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid config.
//!
//! ```toml
//! readers = 8
//! writers = 2
//! operations_per_thread = 500
//! read_hold_us = 20
//! write_hold_us = 50
//! seed = 42
//!
//! [lock]
//! label = "aggregation"
//! ```

use std::path::Path;

use serde::Deserialize;
use turnstile_core::LockConfig;

use crate::error::{HarnessError, HarnessResult};

/// Parameters of one stress run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressConfig {
    /// Reader threads.
    pub readers: usize,
    /// Writer threads.
    pub writers: usize,
    /// Acquire/hold/release cycles per thread.
    pub operations_per_thread: usize,
    /// Upper bound of the random hold time under the read role (µs).
    pub read_hold_us: u64,
    /// Upper bound of the random hold time under the write role (µs).
    pub write_hold_us: u64,
    /// Seed for the per-thread jitter generators.
    pub seed: u64,
    /// Options for the lock under test.
    pub lock: LockConfig,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            readers: 8,
            writers: 2,
            operations_per_thread: 500,
            read_hold_us: 20,
            write_hold_us: 50,
            seed: 42,
            lock: LockConfig::labeled("stress"),
        }
    }
}

impl StressConfig {
    /// A small, fast config for smoke runs.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            readers: 4,
            writers: 2,
            operations_per_thread: 100,
            read_hold_us: 5,
            write_hold_us: 10,
            ..Self::default()
        }
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigParse`] for malformed TOML or unknown
    /// keys, [`HarnessError::InvalidConfig`] if validation fails.
    pub fn from_toml_str(text: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigRead`] if the file cannot be read, plus
    /// everything [`StressConfig::from_toml_str`] returns.
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that the config describes a runnable workload.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] when there are no threads at
    /// all or no operations per thread.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.readers == 0 && self.writers == 0 {
            return Err(HarnessError::InvalidConfig(
                "need at least one reader or writer".to_owned(),
            ));
        }
        if self.operations_per_thread == 0 {
            return Err(HarnessError::InvalidConfig(
                "operations_per_thread must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Total threads the workload spawns.
    #[inline]
    #[must_use]
    pub const fn thread_count(&self) -> usize {
        self.readers + self.writers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = StressConfig::from_toml_str("").unwrap();
        assert_eq!(config.readers, 8);
        assert_eq!(config.writers, 2);
        assert_eq!(config.lock.label, "stress");
    }

    #[test]
    fn test_partial_override() {
        let config = StressConfig::from_toml_str(
            r#"
            writers = 5
            seed = 7

            [lock]
            label = "totals"
            "#,
        )
        .unwrap();
        assert_eq!(config.writers, 5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.readers, 8);
        assert_eq!(config.lock.label, "totals");
        assert_eq!(config.thread_count(), 13);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = StressConfig::from_toml_str("timeout_ms = 5").unwrap_err();
        assert!(matches!(err, HarnessError::ConfigParse(_)));
    }

    #[test]
    fn test_validation() {
        let err = StressConfig::from_toml_str("readers = 0\nwriters = 0").unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));

        let err = StressConfig::from_toml_str("operations_per_thread = 0").unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));

        assert!(StressConfig::from_toml_str("readers = 0").is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = StressConfig::load("/nonexistent/turnstile/stress.toml").unwrap_err();
        assert!(matches!(err, HarnessError::ConfigRead { .. }));
    }
}
