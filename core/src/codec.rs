//! Checksum & codec — GameState to/from the transport envelope string.
//!
//! Wire format (fixed, shared with exports and cloud slots):
//!
//!   "V<version>:<timestamp>:<base64-of-utf8-json>"
//!
//! Exactly two colons split the three fields; version is a bare integer
//! with no leading-zero padding. The base64 payload is the canonical
//! JSON document of the state, which is deterministic because GameState
//! serializes in declaration order with BTreeMap maps.
//!
//! Decoding never panics past this boundary: anything structurally
//! wrong is `SaveError::Malformed`, which callers treat as "no usable
//! save".

use crate::error::{SaveError, SaveResult};
use crate::state::{self, GameState};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};
use xxhash_rust::xxh32::xxh32;

/// Fixed seed so checksums are stable across builds.
const CHECKSUM_SEED: u32 = 0;

/// A decoded save envelope, parsed into typed form at the boundary.
/// All internal logic operates on this, never on the raw string.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveEnvelope {
    pub version: u32,
    pub timestamp_ms: u64,
    pub document: Map<String, Value>,
}

/// Digest of a serialized state payload. Not cryptographic — it only
/// needs to answer "did this blob change" for one player's save.
pub fn state_checksum(payload: &[u8]) -> u32 {
    xxh32(payload, CHECKSUM_SEED)
}

/// Canonical JSON bytes for a state. Same state in, same bytes out.
pub fn canonical_payload(state: &GameState) -> SaveResult<Vec<u8>> {
    Ok(serde_json::to_vec(state)?)
}

/// Checksum of a state's canonical payload.
pub fn checksum_of(state: &GameState) -> SaveResult<u32> {
    Ok(state_checksum(&canonical_payload(state)?))
}

/// Encode a state into the envelope string.
pub fn encode(state: &GameState, version: u32, timestamp_ms: u64) -> SaveResult<String> {
    let payload = canonical_payload(state)?;
    Ok(format!("V{version}:{timestamp_ms}:{}", BASE64.encode(payload)))
}

/// Encode an arbitrary save document (used for slots holding
/// non-current-version saves, e.g. in migration tooling).
pub fn encode_document(
    document: &Map<String, Value>,
    version: u32,
    timestamp_ms: u64,
) -> SaveResult<String> {
    let payload = serde_json::to_vec(&Value::Object(document.clone()))?;
    Ok(format!("V{version}:{timestamp_ms}:{}", BASE64.encode(payload)))
}

/// Decode an envelope string into typed form.
pub fn decode(envelope: &str) -> SaveResult<SaveEnvelope> {
    let (version, timestamp_ms, payload) = decode_raw(envelope)?;
    let text = String::from_utf8(payload).map_err(|_| malformed("payload is not UTF-8"))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| malformed(&format!("payload is not JSON: {e}")))?;
    match value {
        Value::Object(document) => Ok(SaveEnvelope {
            version,
            timestamp_ms,
            document,
        }),
        _ => Err(malformed("payload is not a JSON object")),
    }
}

/// Checksum of the payload bytes inside an envelope string, without
/// requiring the payload to match any schema. Used to validate cloud
/// slots before adoption.
pub fn envelope_checksum(envelope: &str) -> SaveResult<u32> {
    let (_, _, payload) = decode_raw(envelope)?;
    Ok(state_checksum(&payload))
}

/// Validate an envelope's payload against a previously recorded digest.
pub fn verify_envelope_checksum(envelope: &str, expected: u32) -> SaveResult<()> {
    let actual = envelope_checksum(envelope)?;
    if actual != expected {
        return Err(SaveError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

fn decode_raw(envelope: &str) -> SaveResult<(u32, u64, Vec<u8>)> {
    let rest = envelope
        .strip_prefix('V')
        .ok_or_else(|| malformed("missing 'V' version tag"))?;

    let mut parts = rest.splitn(3, ':');
    let version_part = parts.next().unwrap_or("");
    let timestamp_part = parts.next().ok_or_else(|| malformed("missing timestamp field"))?;
    let payload_part = parts.next().ok_or_else(|| malformed("missing payload field"))?;

    if version_part.is_empty() || !version_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("version is not a bare integer"));
    }
    if version_part.len() > 1 && version_part.starts_with('0') {
        return Err(malformed("version has leading zero padding"));
    }
    let version: u32 = version_part
        .parse()
        .map_err(|_| malformed("version out of range"))?;

    let timestamp_ms: u64 = timestamp_part
        .parse()
        .map_err(|_| malformed("timestamp is not an integer"))?;

    let payload = BASE64
        .decode(payload_part)
        .map_err(|e| malformed(&format!("payload is not valid base64: {e}")))?;

    Ok((version, timestamp_ms, payload))
}

fn malformed(reason: &str) -> SaveError {
    SaveError::Malformed {
        reason: reason.to_string(),
    }
}
