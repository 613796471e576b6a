//! Cloud sync — named save slots over a pluggable backend, with
//! same-device vs. cross-device conflict detection and resolution.
//!
//! RULES:
//!   - Within one sync() call the remote read always completes before
//!     the comparison and any write. A sync never writes blind.
//!   - Cross-device conflicts are resolved by an explicit decision
//!     (automatic or user-supplied), never by a lock.
//!   - Backend failures become SyncResult { success: false } at this
//!     boundary and are retried only on the next scheduled interval.

use crate::codec::{self, SaveEnvelope};
use crate::compat::{self, CompatibilityReport};
use crate::config::EngineConfig;
use crate::error::{SaveError, SaveResult};
use crate::event::SaveEvent;
use crate::merge;
use crate::migrate;
use crate::schema::CURRENT_SAVE_VERSION;
use crate::state::{self, GameState};
use crate::store::{CloudSlotRow, SaveStore};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// The four backend verbs. Any REST-like transport over slot ids
/// satisfies this; the crate ships a SQLite-backed implementation and
/// an in-memory one.
pub trait SyncBackend {
    fn list_slots(&self) -> SaveResult<Vec<CloudSlotRow>>;
    fn get_slot(&self, slot_id: &str) -> SaveResult<Option<CloudSlotRow>>;
    fn save_slot(&self, row: &CloudSlotRow) -> SaveResult<()>;
    fn delete_slot(&self, slot_id: &str) -> SaveResult<()>;
}

impl<B: SyncBackend + ?Sized> SyncBackend for &B {
    fn list_slots(&self) -> SaveResult<Vec<CloudSlotRow>> {
        (**self).list_slots()
    }

    fn get_slot(&self, slot_id: &str) -> SaveResult<Option<CloudSlotRow>> {
        (**self).get_slot(slot_id)
    }

    fn save_slot(&self, row: &CloudSlotRow) -> SaveResult<()> {
        (**self).save_slot(row)
    }

    fn delete_slot(&self, slot_id: &str) -> SaveResult<()> {
        (**self).delete_slot(slot_id)
    }
}

/// Local-store fallback backend: slots live in the save database.
pub struct SqliteBackend {
    store: SaveStore,
}

impl SqliteBackend {
    pub fn new(store: SaveStore) -> Self {
        Self { store }
    }
}

impl SyncBackend for SqliteBackend {
    fn list_slots(&self) -> SaveResult<Vec<CloudSlotRow>> {
        self.store.list_slots()
    }

    fn get_slot(&self, slot_id: &str) -> SaveResult<Option<CloudSlotRow>> {
        self.store.get_slot(slot_id)
    }

    fn save_slot(&self, row: &CloudSlotRow) -> SaveResult<()> {
        self.store.upsert_slot(row)
    }

    fn delete_slot(&self, slot_id: &str) -> SaveResult<()> {
        self.store.delete_slot(slot_id)
    }
}

/// In-memory backend for tests and dry runs.
#[derive(Default)]
pub struct MemoryBackend {
    slots: RefCell<BTreeMap<String, CloudSlotRow>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncBackend for MemoryBackend {
    fn list_slots(&self) -> SaveResult<Vec<CloudSlotRow>> {
        let mut rows: Vec<CloudSlotRow> = self.slots.borrow().values().cloned().collect();
        rows.sort_by(|a, b| b.last_modified_ms.cmp(&a.last_modified_ms));
        Ok(rows)
    }

    fn get_slot(&self, slot_id: &str) -> SaveResult<Option<CloudSlotRow>> {
        Ok(self.slots.borrow().get(slot_id).cloned())
    }

    fn save_slot(&self, row: &CloudSlotRow) -> SaveResult<()> {
        self.slots
            .borrow_mut()
            .insert(row.slot_id.clone(), row.clone());
        Ok(())
    }

    fn delete_slot(&self, slot_id: &str) -> SaveResult<()> {
        self.slots.borrow_mut().remove(slot_id);
        Ok(())
    }
}

// ── Result types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    FirstUpload,
    Uploaded,
    Downloaded,
    UpToDate,
    Conflict,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    KeepLocal,
    KeepRemote,
    Merge,
}

/// Metadata block describing one side of a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotMeta {
    pub device_id: String,
    pub timestamp_ms: u64,
    pub checksum: u32,
}

/// A detected cross-device conflict. No data has been written; the
/// caller must resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConflict {
    pub local: SlotMeta,
    pub remote: SlotMeta,
    pub remote_slot_id: String,
    pub recommended: ResolveStrategy,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub success: bool,
    pub action: SyncAction,
    pub message: String,
    /// The state to adopt, when the sync decided the remote side wins.
    pub adopted: Option<GameState>,
    pub conflict: Option<SyncConflict>,
}

impl SyncResult {
    fn ok(action: SyncAction, message: impl Into<String>) -> Self {
        Self {
            success: true,
            action,
            message: message.into(),
            adopted: None,
            conflict: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            action: SyncAction::Failed,
            message: message.into(),
            adopted: None,
            conflict: None,
        }
    }
}

/// A fetched remote save, decoded but not yet adopted.
#[derive(Debug, Clone)]
pub struct RemoteSave {
    pub slot: CloudSlotRow,
    pub envelope: SaveEnvelope,
    pub report: CompatibilityReport,
}

// ── Manager ────────────────────────────────────────────────────────

pub struct SyncManager<B: SyncBackend> {
    backend: B,
    device_id: String,
    config: EngineConfig,
    is_syncing: bool,
}

impl<B: SyncBackend> SyncManager<B> {
    /// Create a manager with a fresh device identity.
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self::with_device_id(backend, config, uuid::Uuid::new_v4().to_string())
    }

    /// Create a manager with a known device identity (the host persists
    /// the id so it is stable across launches).
    pub fn with_device_id(backend: B, config: EngineConfig, device_id: String) -> Self {
        Self {
            backend,
            device_id,
            config,
            is_syncing: false,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn auto_slot_id(&self) -> String {
        format!("auto-{}", self.device_id)
    }

    // ── Upload ─────────────────────────────────────────────────

    /// Wrap the state in an envelope, checksum it, and store it under a
    /// slot id derived from the device id (auto) or timestamp (manual).
    /// Auto-slots beyond the retention cap are evicted oldest-first.
    pub fn upload(
        &mut self,
        state: &GameState,
        version: u32,
        name: &str,
        is_auto: bool,
        timestamp_ms: u64,
    ) -> SyncResult {
        match self.upload_inner(state, version, name, is_auto, timestamp_ms) {
            Ok(()) => SyncResult::ok(SyncAction::Uploaded, format!("Uploaded \"{name}\".")),
            Err(e) => SyncResult::failed(e.to_string()),
        }
    }

    fn upload_inner(
        &mut self,
        state: &GameState,
        version: u32,
        name: &str,
        is_auto: bool,
        timestamp_ms: u64,
    ) -> SaveResult<()> {
        let envelope = codec::encode(state, version, timestamp_ms)?;
        let checksum = codec::checksum_of(state)?;
        let slot_id = if is_auto {
            self.auto_slot_id()
        } else {
            format!("manual-{timestamp_ms}")
        };
        let row = CloudSlotRow {
            slot_id,
            name: name.to_string(),
            device_id: self.device_id.clone(),
            last_modified_ms: timestamp_ms,
            size_bytes: envelope.len() as u64,
            is_auto,
            checksum,
            envelope,
        };
        self.backend.save_slot(&row)?;
        if is_auto {
            self.evict_stale_auto_slots()?;
        }
        Ok(())
    }

    /// Keep at most `auto_slot_retention` auto-slots; manual slots are
    /// never auto-deleted.
    fn evict_stale_auto_slots(&mut self) -> SaveResult<()> {
        let slots = self.backend.list_slots()?;
        let auto: Vec<&CloudSlotRow> = slots.iter().filter(|s| s.is_auto).collect();
        for stale in auto.iter().skip(self.config.auto_slot_retention) {
            log::info!("evicting stale auto-slot {}", stale.slot_id);
            self.backend.delete_slot(&stale.slot_id)?;
        }
        Ok(())
    }

    // ── Download ───────────────────────────────────────────────

    /// Fetch a specific slot, or the most recent auto-slot when no id
    /// is given. A checksum mismatch means the slot is corrupt and is
    /// treated exactly like not-found.
    pub fn download(&self, slot_id: Option<&str>) -> SaveResult<Option<RemoteSave>> {
        let row = match slot_id {
            Some(id) => self.backend.get_slot(id)?,
            None => self
                .backend
                .list_slots()?
                .into_iter()
                .find(|s| s.is_auto),
        };
        let Some(row) = row else {
            return Ok(None);
        };
        self.open_slot(row)
    }

    fn open_slot(&self, row: CloudSlotRow) -> SaveResult<Option<RemoteSave>> {
        if let Err(e) = codec::verify_envelope_checksum(&row.envelope, row.checksum) {
            log::warn!("slot {} failed validation: {e}", row.slot_id);
            return Ok(None);
        }
        let envelope = match codec::decode(&row.envelope) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("slot {} failed to decode: {e}", row.slot_id);
                return Ok(None);
            }
        };
        let report = compat::analyze_against_current(envelope.version, &envelope.document);
        Ok(Some(RemoteSave {
            slot: row,
            envelope,
            report,
        }))
    }

    /// Turn a fetched remote save into a current-version GameState.
    /// The analyzer's hard veto still applies.
    pub fn adopt(&self, remote: &RemoteSave) -> SaveResult<GameState> {
        if !remote.report.compatible {
            return Err(SaveError::CriticalIncompatibility {
                missing: remote.report.missing_features.clone(),
            });
        }
        let outcome = migrate::migrate(
            &remote.envelope.document,
            remote.envelope.version,
            CURRENT_SAVE_VERSION,
        )?;
        state::from_document(outcome.document)
    }

    // ── Sync ───────────────────────────────────────────────────

    /// One full sync cycle against the most recent remote auto-slot.
    /// Re-entrant calls are suppressed while a cycle is in flight.
    pub fn sync(&mut self, local_state: &GameState, local_timestamp_ms: u64) -> SyncResult {
        if self.is_syncing {
            return SyncResult {
                success: true,
                action: SyncAction::Skipped,
                message: "Sync already in progress.".to_string(),
                adopted: None,
                conflict: None,
            };
        }
        self.is_syncing = true;
        let result = self.sync_inner(local_state, local_timestamp_ms);
        self.is_syncing = false;
        match result {
            Ok(result) => result,
            Err(e) => {
                log::warn!("sync failed: {e}");
                SyncResult::failed(e.to_string())
            }
        }
    }

    fn sync_inner(
        &mut self,
        local_state: &GameState,
        local_timestamp_ms: u64,
    ) -> SaveResult<SyncResult> {
        // The remote read completes before any comparison or write.
        let remote = self
            .backend
            .list_slots()?
            .into_iter()
            .find(|s| s.is_auto);

        let Some(remote_row) = remote else {
            self.upload_inner(
                local_state,
                CURRENT_SAVE_VERSION,
                "Auto sync",
                true,
                local_timestamp_ms,
            )?;
            return Ok(SyncResult::ok(
                SyncAction::FirstUpload,
                "First sync: uploaded local save.",
            ));
        };

        let local_checksum = codec::checksum_of(local_state)?;

        // Equal checksums mean equal envelopes, timestamps irrelevant.
        if remote_row.checksum == local_checksum {
            return Ok(SyncResult::ok(SyncAction::UpToDate, "Already in sync."));
        }

        let remote_timestamp = remote_row.last_modified_ms;
        let remote_device = remote_row.device_id.clone();
        let remote_slot_id = remote_row.slot_id.clone();

        if remote_device == self.device_id {
            // Same linear history: newer timestamp wins unconditionally.
            if remote_timestamp > local_timestamp_ms {
                return self.adopt_row(remote_row);
            }
            self.upload_inner(
                local_state,
                CURRENT_SAVE_VERSION,
                "Auto sync",
                true,
                local_timestamp_ms,
            )?;
            return Ok(SyncResult::ok(SyncAction::Uploaded, "Uploaded newer local save."));
        }

        // Cross-device: close timestamps mean concurrent use — neither
        // side is authoritative, and nothing is written until resolved.
        let gap_ms = remote_timestamp.abs_diff(local_timestamp_ms);
        if gap_ms < self.config.conflict_window_ms {
            let notice = SaveEvent::SyncConflictDetected {
                local_device: self.device_id.clone(),
                remote_device: remote_device.clone(),
                gap_ms,
            };
            let conflict = SyncConflict {
                local: SlotMeta {
                    device_id: self.device_id.clone(),
                    timestamp_ms: local_timestamp_ms,
                    checksum: local_checksum,
                },
                remote: SlotMeta {
                    device_id: remote_device,
                    timestamp_ms: remote_timestamp,
                    checksum: remote_row.checksum,
                },
                remote_slot_id,
                recommended: ResolveStrategy::Merge,
            };
            return Ok(SyncResult {
                success: true,
                action: SyncAction::Conflict,
                message: notice.message(),
                adopted: None,
                conflict: Some(conflict),
            });
        }

        // A large gap means the devices were used sequentially: the
        // strictly newer side wins.
        if remote_timestamp > local_timestamp_ms {
            self.adopt_row(remote_row)
        } else {
            self.upload_inner(
                local_state,
                CURRENT_SAVE_VERSION,
                "Auto sync",
                true,
                local_timestamp_ms,
            )?;
            Ok(SyncResult::ok(
                SyncAction::Uploaded,
                "Uploaded newer local save.",
            ))
        }
    }

    fn adopt_row(&mut self, row: CloudSlotRow) -> SaveResult<SyncResult> {
        let Some(remote) = self.open_slot(row)? else {
            // Corrupt remote is not-found-equivalent; local is untouched.
            return Ok(SyncResult::failed("Remote save is corrupt; kept local save."));
        };
        if remote.report.requires_manual_action {
            return Ok(SyncResult::failed(
                "Remote save needs manual confirmation before it can be adopted.",
            ));
        }
        let state = self.adopt(&remote)?;
        let mut result = SyncResult::ok(SyncAction::Downloaded, "Adopted newer remote save.");
        result.adopted = Some(state);
        Ok(result)
    }

    // ── Conflict resolution ────────────────────────────────────

    /// Resolve a previously reported conflict. Returns the state the
    /// session should adopt. `keep-local` and `merge` write the winning
    /// state back to the backend; `keep-remote` writes nothing.
    pub fn resolve_conflict(
        &mut self,
        local_state: &GameState,
        conflict: &SyncConflict,
        strategy: ResolveStrategy,
        timestamp_ms: u64,
    ) -> SaveResult<GameState> {
        match strategy {
            ResolveStrategy::KeepLocal => {
                self.upload_inner(
                    local_state,
                    CURRENT_SAVE_VERSION,
                    "Auto sync",
                    true,
                    timestamp_ms,
                )?;
                Ok(local_state.clone())
            }
            ResolveStrategy::KeepRemote => {
                let remote = self.fetch_conflict_remote(&conflict.remote_slot_id)?;
                self.adopt(&remote)
            }
            ResolveStrategy::Merge => {
                let remote = self.fetch_conflict_remote(&conflict.remote_slot_id)?;
                let remote_state = self.adopt(&remote)?;
                let merged = merge::merge_states(local_state, &remote_state);
                self.upload_inner(&merged, CURRENT_SAVE_VERSION, "Auto sync", true, timestamp_ms)?;
                Ok(merged)
            }
        }
    }

    fn fetch_conflict_remote(&self, slot_id: &str) -> SaveResult<RemoteSave> {
        self.download(Some(slot_id))?
            .ok_or_else(|| SaveError::BackendUnavailable {
                reason: format!("conflict slot {slot_id} is missing or corrupt"),
            })
    }
}
