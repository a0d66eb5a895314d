//! Configuration for the diagram services

use std::time::Duration;

/// Timing configuration for autosave and error reporting
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet window before a burst of mutations is persisted
    pub throttle_window: Duration,
    /// How long the "Saved" indicator is shown before reverting
    pub saved_display: Duration,
    /// Window within which repeated failures collapse to one message
    pub error_debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_secs(5),
            saved_display: Duration::from_secs(2),
            error_debounce: Duration::from_secs(3),
        }
    }
}
