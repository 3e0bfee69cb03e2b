//! Durable queue storage abstraction and the SQLite implementation.

pub mod sqlite;

use crate::record::MutationRecord;

/// Errors from the durable store.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    Sqlite(rusqlite::Error),
    /// Snapshot encode failure.
    Serde(serde_json::Error),
    /// Any other storage failure.
    Message(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StoreError::Serde(e) => write!(f, "snapshot encode error: {e}"),
            StoreError::Message(msg) => f.write_str(msg),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// On-device persistence for the pending queue and the auth credential.
///
/// The store is the single source of truth for pending work: once a save
/// returns, no record exists only in memory. `save` replaces the entire
/// snapshot; there is never a partially written queue visible to a reader.
pub trait QueueStore: Send {
    /// Loads the pending queue in enqueue order.
    ///
    /// A missing snapshot is an empty queue. An unreadable snapshot is also
    /// an empty queue: the corrupt payload is logged and dropped rather than
    /// surfaced, so a decode bug can never wedge the app. Only infrastructure
    /// failures (the storage itself erroring) return `Err`.
    fn load(&mut self) -> StoreResult<Vec<MutationRecord>>;

    /// Atomically replaces the persisted queue with `records`.
    fn save(&mut self, records: &[MutationRecord]) -> StoreResult<()>;

    /// Reads the bearer token, if one is stored.
    fn auth_token(&mut self) -> StoreResult<Option<String>>;

    /// Writes or clears the bearer token. Login flows store it here; logout
    /// clears it, which makes subsequent replay runs no-ops.
    fn put_auth_token(&mut self, token: Option<&str>) -> StoreResult<()>;
}
