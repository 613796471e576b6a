//! Local persistence — periodic and on-demand save/load of the
//! mode-aware state under one fixed storage key.
//!
//! Every save path runs `ModeSnapshot::state_to_persist` first, then
//! encodes, and writes to durable storage as the very last step —
//! partial writes are never acceptable. Every load path runs the
//! analyzer before any state reaches the session.

use crate::codec::{self, SaveEnvelope};
use crate::compat::{self, CompatibilityReport};
use crate::config::EngineConfig;
use crate::error::{SaveError, SaveResult};
use crate::event::SaveEvent;
use crate::migrate;
use crate::mode::ModeSnapshot;
use crate::schema::CURRENT_SAVE_VERSION;
use crate::state::{self, GameState};
use crate::store::SaveStore;

/// The outcome of a load attempt. Only `Loaded` and `Migrated` carry a
/// usable state; in every other case the in-memory state stays at its
/// canonical default.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No save exists under the storage key.
    Empty,
    /// Versions matched; the save document was reconciled onto the
    /// initial state and loaded unchanged.
    Loaded {
        state: GameState,
        report: CompatibilityReport,
    },
    /// Versions differed and migration ran unattended.
    Migrated {
        state: GameState,
        report: CompatibilityReport,
        notice: SaveEvent,
    },
    /// Compatible, but the analyzer asks for a manual decision (backup
    /// prompt). Call `force_load` with the envelope to proceed.
    NeedsDecision {
        envelope: SaveEnvelope,
        report: CompatibilityReport,
        notice: SaveEvent,
    },
    /// Hard veto: loading would lose critical fields.
    Refused {
        report: CompatibilityReport,
        notice: SaveEvent,
    },
    /// The stored envelope is unreadable — treated as no usable save.
    Corrupt { notice: SaveEvent },
    /// Migration to the current version failed. The stored save is left
    /// untouched and the load aborts.
    MigrationFailed { notice: SaveEvent },
}

pub struct SaveManager {
    store: SaveStore,
    config: EngineConfig,
}

impl SaveManager {
    pub fn new(store: SaveStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Persist the current state. Runs the mode-isolation choke point,
    /// encodes fully, then writes once.
    ///
    /// A manual save returns a user-visible acknowledgement; an autosave
    /// is silent on success.
    pub fn save(
        &self,
        live_state: &GameState,
        snapshot: &ModeSnapshot,
        manual: bool,
    ) -> SaveResult<Option<SaveEvent>> {
        let state = snapshot.state_to_persist(live_state);
        let timestamp_ms = now_ms();
        let envelope = codec::encode(state, CURRENT_SAVE_VERSION, timestamp_ms)?;
        self.store
            .put_local_save(&self.config.storage_key, &envelope, timestamp_ms)?;
        if manual {
            Ok(Some(SaveEvent::ManualSaveCompleted { timestamp_ms }))
        } else {
            log::debug!("autosave written at {timestamp_ms}");
            Ok(None)
        }
    }

    /// Load from the fixed storage key.
    pub fn load(&self) -> SaveResult<LoadOutcome> {
        let Some(raw) = self.store.get_local_save(&self.config.storage_key)? else {
            return Ok(LoadOutcome::Empty);
        };
        Ok(self.evaluate(&raw))
    }

    /// Run an envelope string through the full load pipeline without
    /// touching the store. This is the import path: the same decode
    /// handles pasted strings and `.txt` file contents.
    pub fn import_envelope(&self, envelope_str: &str) -> SaveResult<LoadOutcome> {
        Ok(self.evaluate(envelope_str))
    }

    /// The current local save as an export string, if one exists.
    pub fn export_envelope(&self) -> SaveResult<Option<String>> {
        self.store.get_local_save(&self.config.storage_key)
    }

    /// Proceed with a load the analyzer flagged for manual action.
    /// Still refuses critically incompatible saves — the hard veto is
    /// never overridable.
    pub fn force_load(&self, envelope: &SaveEnvelope) -> SaveResult<(GameState, SaveEvent)> {
        let report = compat::analyze_against_current(envelope.version, &envelope.document);
        if !report.compatible {
            return Err(SaveError::CriticalIncompatibility {
                missing: report.missing_features,
            });
        }
        let outcome = migrate::migrate(&envelope.document, envelope.version, CURRENT_SAVE_VERSION)?;
        let state = state::from_document(outcome.document)?;
        let notice = SaveEvent::SaveMigrated {
            from_version: envelope.version,
            to_version: CURRENT_SAVE_VERSION,
            dropped_fields: outcome.dropped_fields,
        };
        Ok((state, notice))
    }

    fn evaluate(&self, raw: &str) -> LoadOutcome {
        let envelope = match codec::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("stored save is unreadable: {e}");
                return LoadOutcome::Corrupt {
                    notice: SaveEvent::SaveCorrupted {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let report = compat::analyze_against_current(envelope.version, &envelope.document);

        if !report.compatible {
            return LoadOutcome::Refused {
                notice: SaveEvent::LoadBlocked {
                    report: report.clone(),
                },
                report,
            };
        }

        if report.requires_manual_action {
            return LoadOutcome::NeedsDecision {
                notice: SaveEvent::LoadRequiresConfirmation {
                    report: report.clone(),
                },
                envelope,
                report,
            };
        }

        if envelope.version == CURRENT_SAVE_VERSION {
            // Same version still merges onto the initial state so any
            // field absent from the document is filled, never undefined.
            match state::reconcile(&GameState::initial(), &envelope.document) {
                Ok(state) => LoadOutcome::Loaded { state, report },
                Err(e) => LoadOutcome::Corrupt {
                    notice: SaveEvent::SaveCorrupted {
                        reason: e.to_string(),
                    },
                },
            }
        } else {
            let from_version = envelope.version;
            let migrated =
                match migrate::migrate(&envelope.document, from_version, CURRENT_SAVE_VERSION) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        // The save is left unmodified; the load aborts.
                        log::error!("migration failed, save left untouched: {e}");
                        return LoadOutcome::MigrationFailed {
                            notice: SaveEvent::MigrationFailed {
                                from_version,
                                to_version: CURRENT_SAVE_VERSION,
                                reason: e.to_string(),
                            },
                        };
                    }
                };
            let dropped_fields = migrated.dropped_fields.clone();
            match state::from_document(migrated.document) {
                Ok(state) => LoadOutcome::Migrated {
                    state,
                    notice: SaveEvent::SaveMigrated {
                        from_version,
                        to_version: CURRENT_SAVE_VERSION,
                        dropped_fields,
                    },
                    report,
                },
                Err(e) => LoadOutcome::Corrupt {
                    notice: SaveEvent::SaveCorrupted {
                        reason: e.to_string(),
                    },
                },
            }
        }
    }
}

/// Fixed-interval trigger for autosave and periodic sync. The host
/// drives it from its own timer; this only answers "is it time yet".
#[derive(Debug, Clone)]
pub struct IntervalClock {
    interval_ms: u64,
    last_fired_ms: u64,
}

impl IntervalClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: 0,
        }
    }

    pub fn due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fired_ms) >= self.interval_ms
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_fired_ms = now_ms;
    }
}

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
