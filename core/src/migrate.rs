//! Migration engine — transforms a save document between schema versions.
//!
//! Both directions are the same pure merge: start from the canonical
//! default document for the target version, then overlay every source
//! field whose name exists in the target schema. Fields new to the
//! target keep their defaults; fields that exist only in the source are
//! dropped, and every drop is reported.
//!
//! Total over well-formed input for every in-schedule version pair —
//! structural garbage is a decode-time failure, never a migration-time
//! one. The critical-field veto lives upstream in the analyzer: by the
//! time migrate() runs, a downgrade is known to drop non-critical
//! fields only.

use crate::error::{SaveError, SaveResult};
use crate::schema::{self, CURRENT_SAVE_VERSION, RENAMES};
use serde_json::{Map, Value};

/// The result of a migration: the transformed document plus an
/// observability record of what was left behind.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub from_version: u32,
    pub to_version: u32,
    pub document: Map<String, Value>,
    /// Source fields with no counterpart in the target schema, sorted.
    pub dropped_fields: Vec<String>,
}

/// Migrate a save document from one schema version to another.
pub fn migrate(
    document: &Map<String, Value>,
    from_version: u32,
    to_version: u32,
) -> SaveResult<MigrationOutcome> {
    if to_version > CURRENT_SAVE_VERSION {
        return Err(SaveError::Migration {
            from: from_version,
            to: to_version,
            reason: format!("target version is beyond the known schedule (max {CURRENT_SAVE_VERSION})"),
        });
    }

    if from_version == to_version {
        return Ok(MigrationOutcome {
            from_version,
            to_version,
            document: document.clone(),
            dropped_fields: Vec::new(),
        });
    }

    let source = apply_renames(document, from_version, to_version);
    let target_schema = schema::fields_for(to_version);

    let mut out = schema::default_document(to_version);
    let mut dropped_fields = Vec::new();
    for (key, value) in &source {
        if target_schema.contains(key.as_str()) {
            out.insert(key.clone(), value.clone());
        } else {
            dropped_fields.push(key.clone());
        }
    }
    dropped_fields.sort();

    if !dropped_fields.is_empty() {
        log::info!(
            "migration v{from_version} -> v{to_version} dropped fields: {dropped_fields:?}"
        );
    }

    Ok(MigrationOutcome {
        from_version,
        to_version,
        document: out,
        dropped_fields,
    })
}

/// Map historically renamed fields when the migration crosses the
/// rename boundary, in whichever direction applies.
fn apply_renames(
    document: &Map<String, Value>,
    from_version: u32,
    to_version: u32,
) -> Map<String, Value> {
    let mut out = document.clone();
    for &(at, old_name, new_name) in RENAMES {
        let upgrade_crosses = from_version < at && at <= to_version;
        let downgrade_crosses = to_version < at && at <= from_version;
        if upgrade_crosses {
            if let Some(value) = out.remove(old_name) {
                out.insert(new_name.to_string(), value);
            }
        } else if downgrade_crosses {
            if let Some(value) = out.remove(new_name) {
                out.insert(old_name.to_string(), value);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rename_maps_both_directions() {
        let mut old = Map::new();
        old.insert("symbol_counts".into(), json!({"cherry": 4}));
        let up = apply_renames(&old, 11, 12);
        assert_eq!(up.get("inventory"), Some(&json!({"cherry": 4})));
        assert!(!up.contains_key("symbol_counts"));

        let down = apply_renames(&up, 12, 11);
        assert_eq!(down.get("symbol_counts"), Some(&json!({"cherry": 4})));
        assert!(!down.contains_key("inventory"));
    }

    #[test]
    fn rename_untouched_when_not_crossed() {
        let mut doc = Map::new();
        doc.insert("inventory".into(), json!({"bell": 1}));
        let same_side = apply_renames(&doc, 14, 20);
        assert!(same_side.contains_key("inventory"));
    }
}
