//! The version ↔ field schedule.
//!
//! Every save version is tied to a fixed historical schedule of feature
//! additions. The running code only ever writes CURRENT_SAVE_VERSION;
//! older versions exist so the analyzer and migration engine can reason
//! about saves written by other builds.
//!
//! RULE: entries are appended when a feature ships. They are never
//! reused, renumbered, or deleted — a removal is recorded in `removed`,
//! not by dropping the row.

use crate::state::{self, GameState};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// The schema version the running code reads and writes.
pub const CURRENT_SAVE_VERSION: u32 = 29;

/// Fields without which gameplay cannot resume. A save whose rollback
/// would drop one of these is refused outright.
pub const CRITICAL_FIELDS: &[&str] = &[
    "balance",
    "bet_value",
    "inventory",
    "symbol_counts",
    "symbol_levels",
];

/// Historical field renames: (version, old name, new name).
/// Migrations crossing `version` map the value in the matching direction.
pub const RENAMES: &[(u32, &str, &str)] = &[(12, "symbol_counts", "inventory")];

struct FieldSpan {
    name: &'static str,
    introduced: u32,
    removed: Option<u32>,
}

/// One row per top-level GameState field, in the order features shipped.
const FIELD_SCHEDULE: &[FieldSpan] = &[
    FieldSpan { name: "balance",           introduced: 1,  removed: None },
    FieldSpan { name: "bet_value",         introduced: 1,  removed: None },
    FieldSpan { name: "symbol_counts",     introduced: 1,  removed: Some(12) },
    FieldSpan { name: "symbol_levels",     introduced: 1,  removed: None },
    FieldSpan { name: "total_spins",       introduced: 2,  removed: None },
    FieldSpan { name: "lifetime_winnings", introduced: 2,  removed: None },
    FieldSpan { name: "sugar",             introduced: 3,  removed: None },
    FieldSpan { name: "skill_levels",      introduced: 5,  removed: None },
    FieldSpan { name: "debt",              introduced: 7,  removed: None },
    FieldSpan { name: "momentum_level",    introduced: 9,  removed: None },
    FieldSpan { name: "prestige_points",   introduced: 11, removed: None },
    FieldSpan { name: "prestige_level",    introduced: 11, removed: None },
    // v12 reworked the symbol inventory format; see RENAMES.
    FieldSpan { name: "inventory",         introduced: 12, removed: None },
    FieldSpan { name: "scratch_cards",     introduced: 14, removed: None },
    FieldSpan { name: "crafting_slots",    introduced: 17, removed: None },
    FieldSpan { name: "bakery",            introduced: 19, removed: None },
    FieldSpan { name: "daily_streak",      introduced: 22, removed: None },
    FieldSpan { name: "golden_tickets",    introduced: 25, removed: None },
    FieldSpan { name: "ascension_shards",  introduced: 27, removed: None },
    FieldSpan { name: "event_tokens",      introduced: 29, removed: None },
];

pub fn is_critical(field: &str) -> bool {
    CRITICAL_FIELDS.contains(&field)
}

/// The set of field names that make up the schema at `version`.
pub fn fields_for(version: u32) -> BTreeSet<&'static str> {
    FIELD_SCHEDULE
        .iter()
        .filter(|f| f.introduced <= version && f.removed.map_or(true, |r| version < r))
        .map(|f| f.name)
        .collect()
}

/// The canonical default save document for any historical version.
///
/// Built from the current initial state, restricted to the fields that
/// existed at `version`. Fields the current struct no longer carries
/// (removed legacy fields) default to an empty object.
pub fn default_document(version: u32) -> Map<String, Value> {
    let current = state::to_document(&GameState::initial())
        .unwrap_or_default();
    let mut document = Map::new();
    for name in fields_for(version) {
        let value = current
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        document.insert(name.to_string(), value);
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_monotonic_and_capped_at_current() {
        let mut last = 0;
        for f in FIELD_SCHEDULE {
            assert!(f.introduced >= last, "schedule out of order at {}", f.name);
            assert!(f.introduced <= CURRENT_SAVE_VERSION);
            if let Some(r) = f.removed {
                assert!(r > f.introduced, "{} removed before introduced", f.name);
            }
            last = f.introduced;
        }
    }

    #[test]
    fn current_schema_matches_game_state_fields() {
        let document = state::to_document(&GameState::initial()).unwrap();
        let schema = fields_for(CURRENT_SAVE_VERSION);
        for key in document.keys() {
            assert!(schema.contains(key.as_str()), "struct field {key} missing from schedule");
        }
        for name in &schema {
            assert!(document.contains_key(*name), "scheduled field {name} missing from struct");
        }
    }

    #[test]
    fn symbol_counts_exists_only_before_v12() {
        assert!(fields_for(11).contains("symbol_counts"));
        assert!(!fields_for(11).contains("inventory"));
        assert!(!fields_for(12).contains("symbol_counts"));
        assert!(fields_for(12).contains("inventory"));
    }

    #[test]
    fn default_document_fills_removed_fields() {
        let document = default_document(5);
        assert!(document.contains_key("symbol_counts"));
        assert!(!document.contains_key("inventory"));
        assert!(!document.contains_key("bakery"));
    }
}
