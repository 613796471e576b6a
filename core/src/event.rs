//! User-visible notices emitted by the save engine.
//!
//! RULE: silent failure is disallowed anywhere in this subsystem. Every
//! blocked load, successful migration, and sync conflict produces a
//! distinct notice; the host renders `message()` verbatim. The one
//! deliberate silence is a successful autosave.

use crate::compat::CompatibilityReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaveEvent {
    // ── Local persistence ──────────────────────────
    ManualSaveCompleted {
        timestamp_ms: u64,
    },
    SaveMigrated {
        from_version: u32,
        to_version: u32,
        dropped_fields: Vec<String>,
    },
    LoadRequiresConfirmation {
        report: CompatibilityReport,
    },
    LoadBlocked {
        report: CompatibilityReport,
    },
    SaveCorrupted {
        reason: String,
    },
    MigrationFailed {
        from_version: u32,
        to_version: u32,
        reason: String,
    },

    // ── Cloud sync ─────────────────────────────────
    SyncConflictDetected {
        local_device: String,
        remote_device: String,
        gap_ms: u64,
    },
}

impl SaveEvent {
    /// Human-readable text for the host UI.
    pub fn message(&self) -> String {
        match self {
            Self::ManualSaveCompleted { .. } => "Game saved.".to_string(),
            Self::SaveMigrated {
                from_version,
                to_version,
                dropped_fields,
            } => {
                if dropped_fields.is_empty() {
                    format!("Save upgraded from v{from_version} to v{to_version}.")
                } else {
                    format!(
                        "Save migrated from v{from_version} to v{to_version}; \
                         left behind: {}.",
                        dropped_fields.join(", ")
                    )
                }
            }
            Self::LoadRequiresConfirmation { report } => format!(
                "This save was written by a different game version \
                 (v{} vs v{}). Back up before continuing.",
                report.save_version, report.code_version
            ),
            Self::LoadBlocked { report } => format!(
                "This save cannot be loaded: it needs features this game \
                 version lacks ({}).",
                report.missing_features.join(", ")
            ),
            Self::SaveCorrupted { reason } => {
                format!("Saved data could not be read ({reason}). Starting fresh.")
            }
            Self::MigrationFailed {
                from_version,
                to_version,
                reason,
            } => format!(
                "This save could not be converted from v{from_version} to \
                 v{to_version} ({reason}). The save was left unchanged."
            ),
            Self::SyncConflictDetected { gap_ms, .. } => format!(
                "Two devices saved within {} seconds of each other. \
                 Choose which progress to keep, or merge.",
                gap_ms / 1000
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_failure_is_not_reported_as_corruption() {
        let notice = SaveEvent::MigrationFailed {
            from_version: 20,
            to_version: 29,
            reason: "boom".to_string(),
        };
        assert!(notice.message().contains("left unchanged"));
        assert!(
            !notice.message().contains("Starting fresh"),
            "an unmigratable save is not an unreadable one"
        );
    }
}
