use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed save envelope: {reason}")]
    Malformed { reason: String },

    #[error("Checksum mismatch: expected {expected:#010X}, got {actual:#010X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Migration from v{from} to v{to} failed: {reason}")]
    Migration { from: u32, to: u32, reason: String },

    #[error("Save refuses to load: missing critical fields {missing:?}")]
    CriticalIncompatibility { missing: Vec<String> },

    #[error("Mode snapshot is already active")]
    SnapshotAlreadyActive,

    #[error("Mode snapshot is not active")]
    SnapshotNotActive,

    #[error("Sync backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SaveResult<T> = Result<T, SaveError>;
