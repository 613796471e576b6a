//! Version compatibility analyzer scenarios.
//!
//! 1. Same-version load is clean
//! 2. Safe rollback: non-critical missing fields, risk by distance
//! 3. Unsafe rollback: critical missing field is a hard veto
//! 4. Upgrade path is compatible with informational risk only

use sugarspin_core::{
    compat::{self, RiskLevel},
    schema,
};

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: same-version load
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn same_version_is_risk_free() {
    let document = schema::default_document(29);
    let report = compat::analyze(29, 29, &document);

    assert!(report.compatible);
    assert_eq!(report.risk, RiskLevel::None);
    assert!(report.can_auto_migrate);
    assert!(!report.requires_manual_action);
    assert!(report.missing_features.is_empty());
    assert!(report.extra_features.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: safe rollback (save v20 loaded by code v15)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn safe_rollback_reports_medium_risk_at_distance_five() {
    let document = schema::default_document(20);
    let report = compat::analyze(20, 15, &document);

    assert!(report.compatible, "bakery and crafting are not critical");
    assert_eq!(report.risk, RiskLevel::Medium);
    assert!(report.can_auto_migrate);
    assert!(!report.requires_manual_action);
    assert!(
        report.missing_features.contains(&"bakery".to_string()),
        "bakery (v19) is absent from the v15 schema: {:?}",
        report.missing_features
    );
    assert!(report
        .missing_features
        .contains(&"crafting_slots".to_string()));
}

#[test]
fn small_rollback_is_low_risk() {
    let document = schema::default_document(22);
    let report = compat::analyze(22, 20, &document);
    assert!(report.compatible);
    assert_eq!(report.risk, RiskLevel::Low);
    assert!(report.can_auto_migrate);
    assert!(!report.requires_manual_action);
}

#[test]
fn distant_rollback_requires_backup_prompt() {
    // v29 save read by v17 code: distance 12, nothing critical missing
    // (inventory exists in both schemas).
    let document = schema::default_document(29);
    let report = compat::analyze(29, 17, &document);

    assert!(report.compatible);
    assert_eq!(report.risk, RiskLevel::High);
    assert!(report.can_auto_migrate);
    assert!(
        report.requires_manual_action,
        "high risk asks the caller to prompt for a backup first"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: unsafe rollback (save v20 loaded by code v10)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn rollback_past_inventory_rework_is_refused() {
    // The v12 inventory format does not exist in the v10 schema, and
    // inventory is critical: hard veto.
    let document = schema::default_document(20);
    let report = compat::analyze(20, 10, &document);

    assert!(!report.compatible);
    assert_eq!(report.risk, RiskLevel::Critical);
    assert!(!report.can_auto_migrate);
    assert!(report.requires_manual_action);
    assert!(
        report.missing_features.contains(&"inventory".to_string()),
        "inventory must be flagged: {:?}",
        report.missing_features
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Upgrade path
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn upgrade_backfills_and_stays_compatible() {
    let document = schema::default_document(20);
    let report = compat::analyze(20, 29, &document);

    assert!(report.compatible);
    assert!(report.can_auto_migrate);
    assert!(!report.requires_manual_action);
    assert!(report.missing_features.is_empty());
    assert!(
        report.extra_features.contains(&"event_tokens".to_string()),
        "fields new in v29 are backfilled: {:?}",
        report.extra_features
    );
    // Distance 9: still purely routine.
    assert_eq!(report.risk, RiskLevel::None);
}

#[test]
fn long_distance_upgrade_is_informational_low() {
    let document = schema::default_document(5);
    let report = compat::analyze(5, 29, &document);
    assert!(report.compatible);
    assert_eq!(report.risk, RiskLevel::Low);
    assert!(report.can_auto_migrate);
}
