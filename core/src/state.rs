//! The player's economic state — the single source of truth for progress.
//!
//! RULES:
//!   - Every field has a defined default. A GameState is never partially
//!     constructed: loads always merge a save document onto the initial
//!     state (`reconcile`), so missing fields are filled, never undefined.
//!   - Map fields are BTreeMap so the canonical JSON form is deterministic.
//!     The codec and checksum depend on this.

use crate::error::{SaveError, SaveResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Scratch-card side game counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchCardState {
    pub owned: u32,
    pub scratched: u64,
    pub winnings: f64,
}

/// One crafting slot. `recipe = None` means the slot is idle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingSlot {
    pub recipe: Option<String>,
    pub started_at_ms: u64,
    pub duration_ms: u64,
}

/// Bakery sub-economy state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeryState {
    pub ovens: u32,
    pub pastries_baked: u64,
    pub sugar_per_pastry: f64,
}

/// The complete player state at the current schema version.
///
/// Field order here is the canonical JSON field order — append new
/// fields at the end, never reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub balance: f64,
    pub bet_value: f64,
    /// Symbol → owned count.
    pub inventory: BTreeMap<String, u64>,
    /// Symbol → multiplier level.
    pub symbol_levels: BTreeMap<String, u32>,
    pub total_spins: u64,
    pub lifetime_winnings: f64,
    pub sugar: f64,
    pub skill_levels: BTreeMap<String, u32>,
    pub debt: f64,
    pub momentum_level: u32,
    pub prestige_points: f64,
    pub prestige_level: u32,
    pub scratch_cards: ScratchCardState,
    pub crafting_slots: Vec<CraftingSlot>,
    pub bakery: BakeryState,
    pub daily_streak: u32,
    pub golden_tickets: u32,
    pub ascension_shards: f64,
    pub event_tokens: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

impl GameState {
    /// The canonical initial state every new player starts from and every
    /// load merges onto.
    pub fn initial() -> Self {
        Self {
            balance: 100.0,
            bet_value: 1.0,
            inventory: BTreeMap::new(),
            symbol_levels: BTreeMap::new(),
            total_spins: 0,
            lifetime_winnings: 0.0,
            sugar: 0.0,
            skill_levels: BTreeMap::new(),
            debt: 0.0,
            momentum_level: 0,
            prestige_points: 0.0,
            prestige_level: 0,
            scratch_cards: ScratchCardState::default(),
            crafting_slots: vec![CraftingSlot::default(); 3],
            bakery: BakeryState::default(),
            daily_streak: 0,
            golden_tickets: 0,
            ascension_shards: 0.0,
            event_tokens: 0,
        }
    }
}

/// Serialize a state to its JSON document form (an object map).
pub fn to_document(state: &GameState) -> SaveResult<Map<String, Value>> {
    match serde_json::to_value(state)? {
        Value::Object(map) => Ok(map),
        other => Err(SaveError::Malformed {
            reason: format!("state serialized to non-object JSON: {other}"),
        }),
    }
}

/// Deserialize a JSON document into a GameState. Missing fields take
/// their defaults; a type mismatch on a present field is malformed input.
pub fn from_document(document: Map<String, Value>) -> SaveResult<GameState> {
    serde_json::from_value(Value::Object(document)).map_err(|e| SaveError::Malformed {
        reason: format!("save document does not match schema: {e}"),
    })
}

/// Explicit two-argument merge: overlay `overrides` onto `defaults`.
///
/// Only fields that exist in the current schema are carried over —
/// unknown fields in `overrides` are dropped, not silently kept.
/// `overrides` wins on every key collision.
pub fn reconcile(defaults: &GameState, overrides: &Map<String, Value>) -> SaveResult<GameState> {
    let mut document = to_document(defaults)?;
    for (key, value) in overrides {
        if document.contains_key(key) {
            document.insert(key.clone(), value.clone());
        }
    }
    from_document(document)
}
