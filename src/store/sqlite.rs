//! SQLite-backed key-value queue store.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::record::MutationRecord;

use super::{QueueStore, StoreResult};

/// Storage key holding the JSON-serialized pending queue.
pub const QUEUE_KEY: &str = "offline_queue";
/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// SQLite implementation of [`QueueStore`].
///
/// One `kv` table; the queue lives under [`QUEUE_KEY`] as a plain JSON array
/// of records, the credential under [`TOKEN_KEY`]. Each save is a single-row
/// transactional upsert, so a crash never leaves a half-written snapshot.
pub struct SqliteQueueStore {
    conn: Connection,
}

impl SqliteQueueStore {
    /// Opens or creates a store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    fn get_raw(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_raw(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_raw(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl QueueStore for SqliteQueueStore {
    fn load(&mut self) -> StoreResult<Vec<MutationRecord>> {
        let Some(raw) = self.get_raw(QUEUE_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice::<Vec<MutationRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(err) => {
                // Fail soft: a corrupt snapshot is treated as an empty queue.
                // Losing buffered work beats never being able to enqueue again.
                warn!(%err, bytes = raw.len(), "discarding unreadable queue snapshot");
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, records: &[MutationRecord]) -> StoreResult<()> {
        let payload = serde_json::to_vec(records)?;
        self.put_raw(QUEUE_KEY, &payload)
    }

    fn auth_token(&mut self) -> StoreResult<Option<String>> {
        let Some(raw) = self.get_raw(TOKEN_KEY)? else {
            return Ok(None);
        };
        match String::from_utf8(raw) {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                warn!(%err, "discarding non-utf8 stored token");
                Ok(None)
            }
        }
    }

    fn put_auth_token(&mut self, token: Option<&str>) -> StoreResult<()> {
        match token {
            Some(token) => self.put_raw(TOKEN_KEY, token.as_bytes()),
            None => self.delete_raw(TOKEN_KEY),
        }
    }
}
