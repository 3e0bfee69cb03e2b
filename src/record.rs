//! Queued mutation data model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::types::{Method, RecordId};

/// Process-wide counter folded into generated ids so two records created in
/// the same millisecond still differ.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A buffered write awaiting replay against the remote API.
///
/// The persisted queue is a JSON array of these records under a single
/// storage key. `payload` is opaque to the queue; it is forwarded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Unique id assigned at enqueue time.
    pub id: RecordId,
    /// Verb the replay request uses.
    pub method: Method,
    /// Server-relative resource path, e.g. `/auth/me`.
    pub target: String,
    /// Request body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Enqueue timestamp in milliseconds since the epoch.
    #[serde(rename = "enqueuedAt")]
    pub enqueued_at: u64,
    /// Transient-failure replay attempts so far. Absent in snapshots written
    /// before the attempt cap existed, hence the default.
    #[serde(default)]
    pub attempts: u32,
}

impl MutationRecord {
    /// Builds a record with a fresh id and the current timestamp.
    pub fn new(method: Method, target: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        let enqueued_at = now_ms();
        Self {
            id: generate_id(enqueued_at),
            method,
            target: target.into(),
            payload,
            enqueued_at,
            attempts: 0,
        }
    }
}

/// Records are equal when their ids are equal; everything else is payload.
impl PartialEq for MutationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MutationRecord {}

fn generate_id(ts_ms: u64) -> RecordId {
    let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ts_ms:x}-{n:x}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
