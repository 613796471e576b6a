//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Managers call store methods — they never execute SQL directly.

use crate::error::SaveResult;
use rusqlite::{params, Connection, OptionalExtension};

/// A cloud save slot row as persisted. `envelope` is the full
/// "V<version>:<timestamp>:<base64>" string; `checksum` is the digest of
/// the payload inside it, stored separately so corruption is detectable
/// without decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudSlotRow {
    pub slot_id: String,
    pub name: String,
    pub device_id: String,
    pub last_modified_ms: u64,
    pub size_bytes: u64,
    pub is_auto: bool,
    pub checksum: u32,
    pub envelope: String,
}

pub struct SaveStore {
    conn: Connection,
}

impl SaveStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> SaveResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SaveResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SaveResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_save.sql"))?;
        Ok(())
    }

    // ── Local save (one fixed key) ─────────────────────────────

    pub fn put_local_save(&self, key: &str, envelope: &str, written_at_ms: u64) -> SaveResult<()> {
        self.conn.execute(
            "INSERT INTO local_save (key, envelope, written_at_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET envelope = ?2, written_at_ms = ?3",
            params![key, envelope, written_at_ms as i64],
        )?;
        Ok(())
    }

    pub fn get_local_save(&self, key: &str) -> SaveResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT envelope FROM local_save WHERE key = ?1")?;
        // Only no-rows maps to None; a read failure must surface, not
        // masquerade as "no save exists".
        let envelope = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        Ok(envelope)
    }

    pub fn delete_local_save(&self, key: &str) -> SaveResult<()> {
        self.conn
            .execute("DELETE FROM local_save WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Cloud slots ────────────────────────────────────────────

    pub fn upsert_slot(&self, row: &CloudSlotRow) -> SaveResult<()> {
        self.conn.execute(
            "INSERT INTO cloud_slot
               (slot_id, name, device_id, last_modified_ms, size_bytes, is_auto, checksum, envelope)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(slot_id) DO UPDATE SET
               name = ?2, device_id = ?3, last_modified_ms = ?4,
               size_bytes = ?5, is_auto = ?6, checksum = ?7, envelope = ?8",
            params![
                row.slot_id,
                row.name,
                row.device_id,
                row.last_modified_ms as i64,
                row.size_bytes as i64,
                row.is_auto,
                row.checksum as i64,
                row.envelope,
            ],
        )?;
        Ok(())
    }

    pub fn get_slot(&self, slot_id: &str) -> SaveResult<Option<CloudSlotRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT slot_id, name, device_id, last_modified_ms, size_bytes, is_auto, checksum, envelope
             FROM cloud_slot WHERE slot_id = ?1",
        )?;
        let row = stmt.query_row(params![slot_id], row_to_slot).optional()?;
        Ok(row)
    }

    /// All slots, most recently modified first.
    pub fn list_slots(&self) -> SaveResult<Vec<CloudSlotRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT slot_id, name, device_id, last_modified_ms, size_bytes, is_auto, checksum, envelope
             FROM cloud_slot ORDER BY last_modified_ms DESC, slot_id ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_slot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_slot(&self, slot_id: &str) -> SaveResult<()> {
        self.conn
            .execute("DELETE FROM cloud_slot WHERE slot_id = ?1", params![slot_id])?;
        Ok(())
    }
}

fn row_to_slot(row: &rusqlite::Row<'_>) -> rusqlite::Result<CloudSlotRow> {
    Ok(CloudSlotRow {
        slot_id: row.get(0)?,
        name: row.get(1)?,
        device_id: row.get(2)?,
        last_modified_ms: row.get::<_, i64>(3)? as u64,
        size_bytes: row.get::<_, i64>(4)? as u64,
        is_auto: row.get(5)?,
        checksum: row.get::<_, i64>(6)? as u32,
        envelope: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // A blob in a TEXT column (or text in an INTEGER column) keeps its
    // storage class under SQLite affinity, so the row exists but the
    // mapper cannot read it.
    #[test]
    fn local_read_errors_are_not_mistaken_for_missing_saves() {
        let store = SaveStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .conn
            .execute("INSERT INTO local_save VALUES ('k', x'00', 0)", [])
            .unwrap();

        assert!(
            store.get_local_save("k").is_err(),
            "an unreadable row must fail loudly, not present as no-save"
        );
        assert!(matches!(store.get_local_save("absent"), Ok(None)));
    }

    #[test]
    fn slot_read_errors_are_not_mistaken_for_missing_slots() {
        let store = SaveStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO cloud_slot VALUES
                   ('s1', 'Auto sync', 'device-a', 'not-a-number', 0, 1, 0, 'V29:0:e30=')",
                [],
            )
            .unwrap();

        assert!(store.get_slot("s1").is_err());
        assert!(matches!(store.get_slot("absent"), Ok(None)));
    }
}
