//! Version compatibility analyzer.
//!
//! Classifies the risk of loading a save written by a different code
//! version, and decides whether migration can run unattended.
//!
//! RULE: this module never mutates state. It classifies. The one hard
//! veto it carries — a rollback that would drop a critical field — is
//! enforced by callers refusing to load when `compatible == false`.
//! Everything else is advisory.

use crate::schema::{self, CURRENT_SAVE_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version distance at which a rollback is considered high risk and a
/// backup prompt is warranted.
const HIGH_RISK_DISTANCE: u32 = 10;
/// Version distance at which a rollback is considered medium risk.
const MEDIUM_RISK_DISTANCE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Derived, never persisted — computed fresh on every load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub save_version: u32,
    pub code_version: u32,
    pub compatible: bool,
    pub risk: RiskLevel,
    /// Fields the save carries that the running code's schema lacks
    /// (rollback: these would be dropped).
    pub missing_features: Vec<String>,
    /// Fields the running code's schema has that the save lacks
    /// (upgrade: these are backfilled with defaults).
    pub extra_features: Vec<String>,
    pub can_auto_migrate: bool,
    pub requires_manual_action: bool,
}

/// Analyze a decoded save document against the running code's schema.
pub fn analyze(
    save_version: u32,
    code_version: u32,
    document: &Map<String, Value>,
) -> CompatibilityReport {
    if save_version == code_version {
        return CompatibilityReport {
            save_version,
            code_version,
            compatible: true,
            risk: RiskLevel::None,
            missing_features: Vec::new(),
            extra_features: Vec::new(),
            can_auto_migrate: true,
            requires_manual_action: false,
        };
    }

    if save_version > code_version {
        analyze_rollback(save_version, code_version, document)
    } else {
        analyze_upgrade(save_version, code_version, document)
    }
}

/// Convenience wrapper against the running code's version.
pub fn analyze_against_current(
    save_version: u32,
    document: &Map<String, Value>,
) -> CompatibilityReport {
    analyze(save_version, CURRENT_SAVE_VERSION, document)
}

/// The save came from newer code than is currently running.
fn analyze_rollback(
    save_version: u32,
    code_version: u32,
    document: &Map<String, Value>,
) -> CompatibilityReport {
    let code_schema = schema::fields_for(code_version);
    let missing_features: Vec<String> = document
        .keys()
        .filter(|k| !code_schema.contains(k.as_str()))
        .cloned()
        .collect();

    let critical_missing = missing_features.iter().any(|f| schema::is_critical(f));
    if critical_missing {
        return CompatibilityReport {
            save_version,
            code_version,
            compatible: false,
            risk: RiskLevel::Critical,
            missing_features,
            extra_features: Vec::new(),
            can_auto_migrate: false,
            requires_manual_action: true,
        };
    }

    let distance = save_version - code_version;
    let risk = if distance >= HIGH_RISK_DISTANCE {
        RiskLevel::High
    } else if distance >= MEDIUM_RISK_DISTANCE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    // At high risk the load is still possible, but the caller should
    // prompt for a backup first.
    let requires_manual_action = risk == RiskLevel::High;

    CompatibilityReport {
        save_version,
        code_version,
        compatible: true,
        risk,
        missing_features,
        extra_features: Vec::new(),
        can_auto_migrate: true,
        requires_manual_action,
    }
}

/// Normal upgrade path: the save is older than the running code.
fn analyze_upgrade(
    save_version: u32,
    code_version: u32,
    document: &Map<String, Value>,
) -> CompatibilityReport {
    let code_schema = schema::fields_for(code_version);
    let extra_features: Vec<String> = code_schema
        .iter()
        .filter(|f| !document.contains_key(**f))
        .map(|f| f.to_string())
        .collect();

    let distance = code_version - save_version;
    // Purely informational — defaults fill everything on upgrade.
    let risk = if distance >= HIGH_RISK_DISTANCE {
        RiskLevel::Low
    } else {
        RiskLevel::None
    };

    CompatibilityReport {
        save_version,
        code_version,
        compatible: true,
        risk,
        missing_features: Vec::new(),
        extra_features,
        can_auto_migrate: true,
        requires_manual_action: false,
    }
}
