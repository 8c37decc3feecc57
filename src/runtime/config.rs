//! Controller configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`Controller`](super::Controller).
///
/// Deserializes with defaults for any missing field, so hosts can keep
/// partial settings in their own config files.
///
/// # Example
///
/// ```rust
/// use framefsm::runtime::ControllerConfig;
///
/// let config = ControllerConfig::default()
///     .with_name("boss-ai")
///     .manual(true)
///     .history_capacity(16);
/// assert_eq!(config.name, "boss-ai");
/// assert!(config.scan_fixed_step);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Label used in logs.
    pub name: String,
    /// Name of the root machine.
    pub root_name: String,
    /// Skip automatic driving by the registry (frame end still arrives).
    pub manual: bool,
    /// Evaluate transfer conditions during the fixed step as well.
    pub scan_fixed_step: bool,
    /// Number of committed transitions kept in the log.
    pub history_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: "controller".to_string(),
            root_name: "Root".to_string(),
            manual: false,
            scan_fixed_step: true,
            history_capacity: 64,
        }
    }
}

impl ControllerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    pub fn scan_fixed_step(mut self, scan: bool) -> Self {
        self.scan_fixed_step = scan;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}
