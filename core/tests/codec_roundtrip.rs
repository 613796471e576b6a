//! Codec round-trip and checksum properties.
//!
//! 1. decode(encode(s)) reproduces version, timestamp, and state exactly
//! 2. checksums are deterministic and sensitive to any state change
//! 3. structurally invalid envelopes fail with a typed error, never panic

use sugarspin_core::{
    codec,
    schema::CURRENT_SAVE_VERSION,
    state::{self, GameState},
};

fn sample_state() -> GameState {
    let mut s = GameState::initial();
    s.balance = 1234.5;
    s.sugar = 99.0;
    s.inventory.insert("cherry".to_string(), 12);
    s.inventory.insert("seven".to_string(), 3);
    s.symbol_levels.insert("cherry".to_string(), 4);
    s.skill_levels.insert("fast_reels".to_string(), 2);
    s.debt = 40.0;
    s.prestige_level = 2;
    s
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn roundtrip_preserves_everything() {
    let original = sample_state();
    let envelope = codec::encode(&original, CURRENT_SAVE_VERSION, 1_700_000_000_123).unwrap();

    let decoded = codec::decode(&envelope).unwrap();
    assert_eq!(decoded.version, CURRENT_SAVE_VERSION);
    assert_eq!(decoded.timestamp_ms, 1_700_000_000_123);

    let state = state::from_document(decoded.document).unwrap();
    assert_eq!(state, original, "round-trip must be exact");
}

#[test]
fn envelope_has_exactly_two_colons() {
    let envelope = codec::encode(&sample_state(), CURRENT_SAVE_VERSION, 42).unwrap();
    assert_eq!(envelope.matches(':').count(), 2);
    assert!(envelope.starts_with(&format!("V{CURRENT_SAVE_VERSION}:42:")));
}

// ─────────────────────────────────────────────────────────────────────────────
// Checksum
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn checksum_is_deterministic() {
    let state = sample_state();
    assert_eq!(
        codec::checksum_of(&state).unwrap(),
        codec::checksum_of(&state).unwrap()
    );
}

#[test]
fn checksum_changes_when_any_field_changes() {
    let base = sample_state();
    let base_checksum = codec::checksum_of(&base).unwrap();

    let mut richer = base.clone();
    richer.balance += 0.5;
    assert_ne!(codec::checksum_of(&richer).unwrap(), base_checksum);

    let mut leveled = base.clone();
    leveled.symbol_levels.insert("bell".to_string(), 1);
    assert_ne!(codec::checksum_of(&leveled).unwrap(), base_checksum);
}

#[test]
fn envelope_checksum_matches_state_checksum() {
    let state = sample_state();
    let envelope = codec::encode(&state, CURRENT_SAVE_VERSION, 7).unwrap();
    assert_eq!(
        codec::envelope_checksum(&envelope).unwrap(),
        codec::checksum_of(&state).unwrap(),
        "the envelope payload is exactly the canonical state bytes"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Malformed input
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn malformed_envelopes_are_typed_errors() {
    for bad in [
        "",
        "V",
        "V29",
        "V29:123",
        "29:123:e30=",
        "Vx:123:e30=",
        "V29:abc:e30=",
        "V29:123:not base64!!",
        "V029:123:e30=",
    ] {
        let result = codec::decode(bad);
        assert!(result.is_err(), "should reject {bad:?}");
    }
}

#[test]
fn non_object_payload_is_rejected() {
    // "[1,2,3]" in base64 is a valid JSON payload but not a save document.
    let envelope = "V29:0:WzEsMiwzXQ==";
    assert!(codec::decode(envelope).is_err());
}
