//! Engine configuration shared between the core crate and its front-ends.
//!
//! Every field has a default so partially written config files (or files
//! from older versions) still load.

use serde::{Deserialize, Serialize};

/// Ticks are never scheduled faster than this.
pub const MIN_TICK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MitigationConfig {
    /// Base URL the definition table is fetched from.
    pub definitions_base_url: String,
    /// Path of the mitigation dataset below the base URL.
    pub definitions_path: String,
    /// Seconds between background refreshes of the definition table.
    pub refresh_interval_secs: u64,
    /// Per-request timeout for the definition fetch.
    pub request_timeout_secs: u64,
    /// Requested tick interval. Clamped to [`MIN_TICK_INTERVAL_MS`].
    pub tick_interval_ms: u64,
    /// Initial per-entity capacity of a standalone collection pass.
    pub collector_capacity: usize,
    /// Initial per-entity capacity of the publisher's scratch buffers.
    pub scratch_capacity: usize,
    /// Most distinct effects one entity may carry in a tick. A tick that
    /// exceeds it is abandoned.
    pub max_effects_per_entity: usize,
    pub european_number_format: bool,
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            definitions_base_url: String::new(),
            definitions_path: "mitigations.json".to_string(),
            refresh_interval_secs: 300,
            request_timeout_secs: 10,
            tick_interval_ms: MIN_TICK_INTERVAL_MS,
            collector_capacity: 64,
            scratch_capacity: 16,
            max_effects_per_entity: 1024,
            european_number_format: false,
        }
    }
}

impl MitigationConfig {
    /// Full URL of the definition dataset, or `None` when no base URL is set.
    pub fn definitions_url(&self) -> Option<String> {
        let base = self.definitions_base_url.trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        let path = self.definitions_path.trim_start_matches('/');
        Some(format!("{}/{}", base, path))
    }

    /// Tick interval honoring the minimum cadence.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS)
    }
}
