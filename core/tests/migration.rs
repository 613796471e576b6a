//! Migration engine properties.
//!
//! 1. Equal-version migration is the identity
//! 2. Upgrade-then-downgrade restores every shared field; intermediate
//!    fields are absent afterward and reported
//! 3. The v12 inventory rename is mapped in both directions
//! 4. Migration is total over every in-schedule version pair

use serde_json::json;
use sugarspin_core::{
    migrate,
    schema::{self, CURRENT_SAVE_VERSION},
    state,
};

// ─────────────────────────────────────────────────────────────────────────────
// Identity and monotonicity
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn equal_versions_is_identity() {
    let mut document = schema::default_document(20);
    document.insert("balance".to_string(), json!(777.0));

    let outcome = migrate::migrate(&document, 20, 20).unwrap();
    assert_eq!(outcome.document, document);
    assert!(outcome.dropped_fields.is_empty());
}

#[test]
fn upgrade_then_downgrade_restores_shared_fields() {
    let mut original = schema::default_document(15);
    original.insert("balance".to_string(), json!(4321.0));
    original.insert("debt".to_string(), json!(55.5));
    original.insert("inventory".to_string(), json!({"cherry": 9}));

    let up = migrate::migrate(&original, 15, CURRENT_SAVE_VERSION).unwrap();
    assert!(
        up.document.contains_key("bakery"),
        "fields new to v29 take their defaults on upgrade"
    );

    let down = migrate::migrate(&up.document, CURRENT_SAVE_VERSION, 15).unwrap();
    for (key, value) in &original {
        assert_eq!(
            down.document.get(key),
            Some(value),
            "field {key} must survive the round trip unchanged"
        );
    }
    assert!(
        !down.document.contains_key("bakery"),
        "fields unique to the higher version are absent after downgrade"
    );
    assert!(
        down.dropped_fields.contains(&"bakery".to_string()),
        "every drop is reported: {:?}",
        down.dropped_fields
    );
}

#[test]
fn upgrade_overlays_old_values_onto_new_defaults() {
    let mut old = schema::default_document(20);
    old.insert("sugar".to_string(), json!(200.0));

    let outcome = migrate::migrate(&old, 20, 29).unwrap();
    assert_eq!(outcome.document.get("sugar"), Some(&json!(200.0)));
    // event_tokens shipped in v29; the old save has no value for it.
    assert_eq!(outcome.document.get("event_tokens"), Some(&json!(0)));
}

// ─────────────────────────────────────────────────────────────────────────────
// The v12 inventory rework
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn inventory_rename_maps_upgrade_and_downgrade() {
    let mut v11 = schema::default_document(11);
    v11.insert("symbol_counts".to_string(), json!({"cherry": 4, "bell": 2}));

    let up = migrate::migrate(&v11, 11, 29).unwrap();
    assert_eq!(
        up.document.get("inventory"),
        Some(&json!({"cherry": 4, "bell": 2})),
        "symbol_counts carries over into the reworked inventory"
    );
    assert!(!up.document.contains_key("symbol_counts"));
    assert!(
        !up.dropped_fields.contains(&"symbol_counts".to_string()),
        "a renamed field is not a dropped field"
    );

    let down = migrate::migrate(&up.document, 29, 11).unwrap();
    assert_eq!(
        down.document.get("symbol_counts"),
        Some(&json!({"cherry": 4, "bell": 2}))
    );
    assert!(!down.document.contains_key("inventory"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Totality
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn migration_is_total_over_the_schedule() {
    for from in 1..=CURRENT_SAVE_VERSION {
        let document = schema::default_document(from);
        for to in 1..=CURRENT_SAVE_VERSION {
            let outcome = migrate::migrate(&document, from, to);
            assert!(
                outcome.is_ok(),
                "migrate v{from} -> v{to} must not fail: {:?}",
                outcome.err()
            );
        }
    }
}

#[test]
fn every_upgrade_produces_a_loadable_current_state() {
    for from in 1..=CURRENT_SAVE_VERSION {
        let document = schema::default_document(from);
        let outcome = migrate::migrate(&document, from, CURRENT_SAVE_VERSION).unwrap();
        let state = state::from_document(outcome.document);
        assert!(
            state.is_ok(),
            "upgraded v{from} document must deserialize: {:?}",
            state.err()
        );
    }
}

#[test]
fn target_beyond_schedule_is_an_error() {
    let document = schema::default_document(29);
    let result = migrate::migrate(&document, 29, CURRENT_SAVE_VERSION + 1);
    assert!(result.is_err());
}
