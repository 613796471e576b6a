//! Mode isolation snapshot — the guard that keeps a bounded-duration
//! alternate economy out of the persisted save.
//!
//! Invariant, held at every observable boundary:
//!   active == true  ⇒ both real_state and mode_state are present
//!   active == false ⇒ both are absent
//!
//! RULE: every persistence path asks `state_to_persist` what to write.
//! That single choke point is what prevents an autosave firing mid-mode
//! from overwriting the real economy.

use crate::error::{SaveError, SaveResult};
use crate::state::GameState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeSnapshot {
    active: bool,
    real_state: Option<GameState>,
    mode_state: Option<GameState>,
}

impl ModeSnapshot {
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Capture the pre-mode state and the freshly constructed mode state.
    ///
    /// Activating twice without deactivating is a programmer error and
    /// fails loudly — silently overwriting the captured real state would
    /// make the real economy unrecoverable.
    pub fn activate(&mut self, real_state: GameState, mode_state: GameState) -> SaveResult<()> {
        if self.active {
            return Err(SaveError::SnapshotAlreadyActive);
        }
        self.real_state = Some(real_state);
        self.mode_state = Some(mode_state);
        self.active = true;
        Ok(())
    }

    /// End the mode and hand back the originally captured real state,
    /// byte-equal to what was captured at activate time. The mode state
    /// is discarded.
    pub fn deactivate(&mut self) -> SaveResult<GameState> {
        if !self.active {
            return Err(SaveError::SnapshotNotActive);
        }
        self.active = false;
        self.mode_state = None;
        self.real_state
            .take()
            .ok_or(SaveError::SnapshotNotActive)
    }

    /// What should actually be written to durable storage right now.
    ///
    /// While a mode is active this is always the captured real state,
    /// never the live (mode) state.
    pub fn state_to_persist<'a>(&'a self, live_state: &'a GameState) -> &'a GameState {
        if self.active {
            // Invariant: active implies real_state is present.
            self.real_state.as_ref().unwrap_or(live_state)
        } else {
            live_state
        }
    }

    /// The live alternate-mode state, if a mode is active.
    pub fn mode_state(&self) -> Option<&GameState> {
        self.mode_state.as_ref()
    }
}
