//! Operator settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchConfig, DEFAULT_INTER_BATCH_DELAY, DEFAULT_MAX_CONCURRENT};

/// Operator-facing settings, serializable into the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rescan pages automatically when they mutate.
    pub auto_scan: bool,
    /// Window size for batch downloads.
    pub max_concurrent_downloads: usize,
    /// Delay between batch windows, in milliseconds.
    pub inter_batch_delay_ms: u64,
    /// Enable the academic metadata/naming pipeline.
    pub academic_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_scan: true,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT,
            inter_batch_delay_ms: u64::try_from(DEFAULT_INTER_BATCH_DELAY.as_millis())
                .unwrap_or(1000),
            academic_mode: true,
        }
    }
}

impl Settings {
    /// Derives the orchestrator configuration from these settings.
    #[must_use]
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_concurrent: self.max_concurrent_downloads,
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
        }
    }
}
