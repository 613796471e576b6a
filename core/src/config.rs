//! Engine configuration — policy parameters, not invariants.
//!
//! The conflict window and auto-slot retention cap ship as defaults the
//! host can override from a JSON config file.

use crate::error::SaveResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The fixed durable-storage key holding the local save.
    pub storage_key: String,
    /// Autosave cadence. Autosaves are silent on success.
    pub autosave_interval_ms: u64,
    /// Periodic cloud sync cadence.
    pub sync_interval_ms: u64,
    /// Two saves from different devices closer together than this are a
    /// conflict rather than a clean winner.
    pub conflict_window_ms: u64,
    /// How many auto-slots to retain per backend; oldest evicted first.
    pub auto_slot_retention: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: "sugarspin_save".to_string(),
            autosave_interval_ms: 30_000,
            sync_interval_ms: 120_000,
            conflict_window_ms: 5 * 60 * 1000,
            auto_slot_retention: 10,
        }
    }
}

impl EngineConfig {
    /// Load config from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> SaveResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }
}
