//! # Lock Configuration

use std::sync::Arc;

use serde::Deserialize;

use crate::budget::ResourceBudget;

/// Label used when none is configured.
pub const DEFAULT_LABEL: &str = "rwlock";

/// Construction options for a lock.
///
/// The label is plain data and can be read from a config file. A budget is
/// attached in code with [`LockConfig::with_budget`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Name carried on every log event the lock emits.
    pub label: String,
    /// Optional budget metering sub-resource construction.
    #[serde(skip)]
    pub budget: Option<Arc<ResourceBudget>>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_owned(),
            budget: None,
        }
    }
}

impl LockConfig {
    /// Creates a config with the given label and no budget.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            budget: None,
        }
    }

    /// Meters construction against `budget`.
    #[must_use]
    pub fn with_budget(mut self, budget: Arc<ResourceBudget>) -> Self {
        self.budget = Some(budget);
        self
    }
}
