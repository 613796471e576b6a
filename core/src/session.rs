//! The gameplay-facing session — owns the live state and the mode
//! snapshot, and exposes the pull/push collaborator interface.
//!
//! Persistence always PULLS the freshest state through
//! `persistable_state()`; resolved or migrated states are PUSHED back
//! through `adopt_state()`.

use crate::error::{SaveError, SaveResult};
use crate::mode::ModeSnapshot;
use crate::state::GameState;

pub struct GameSession {
    state: GameState,
    mode: ModeSnapshot,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::with_state(GameState::initial())
    }

    pub fn with_state(state: GameState) -> Self {
        Self {
            state,
            mode: ModeSnapshot::inactive(),
        }
    }

    pub fn current_state(&self) -> &GameState {
        &self.state
    }

    /// Gameplay mutates the live state through here.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn mode(&self) -> &ModeSnapshot {
        &self.mode
    }

    /// Adopt a migrated or remote-resolved state as the live state.
    /// Not allowed while a mode is active — the adopted state would be
    /// clobbered when the mode ends.
    pub fn adopt_state(&mut self, state: GameState) -> SaveResult<()> {
        if self.mode.is_active() {
            return Err(SaveError::SnapshotAlreadyActive);
        }
        self.state = state;
        Ok(())
    }

    /// Begin the bounded-duration alternate economy. The real state is
    /// captured, and the live state becomes the mode state.
    pub fn enter_mode(&mut self, mode_state: GameState) -> SaveResult<()> {
        self.mode.activate(self.state.clone(), mode_state.clone())?;
        self.state = mode_state;
        Ok(())
    }

    /// End the mode, restoring the captured real state and discarding
    /// everything that happened inside the mode.
    pub fn exit_mode(&mut self) -> SaveResult<()> {
        self.state = self.mode.deactivate()?;
        Ok(())
    }

    /// What a persistence path should write right now.
    pub fn persistable_state(&self) -> &GameState {
        self.mode.state_to_persist(&self.state)
    }
}
