//! Runtime event stream payloads.

use crate::types::RecordId;

/// Events emitted from the single-writer runtime loop.
///
/// These are the crate's reconciliation surface: enqueue acknowledges work
/// the moment it is durable, and every replay fate is observable, including
/// the silent discards the replay policy performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxEvent {
    /// A mutation was persisted to the queue.
    Enqueued {
        /// Assigned record id.
        id: RecordId,
    },
    /// A replay pass is starting over this many pending records.
    ReplayStarted {
        /// Records loaded for the pass.
        pending: usize,
    },
    /// A replay pass found pending records but no stored credential; the
    /// queue was left untouched and no requests were issued.
    ReplaySkippedNoAuth,
    /// The server confirmed a mutation.
    RecordApplied {
        /// Record id.
        id: RecordId,
        /// Response status.
        status: u16,
    },
    /// The server rejected a mutation as invalid; it was discarded.
    RecordRejected {
        /// Record id.
        id: RecordId,
        /// Response status.
        status: u16,
    },
    /// A mutation failed transiently and stays queued.
    RecordRetained {
        /// Record id.
        id: RecordId,
    },
    /// A mutation hit the transient-attempt cap and was discarded.
    RecordExpired {
        /// Record id.
        id: RecordId,
    },
    /// A replay pass finished and the retained subset is durable.
    ReplayFinished {
        /// Confirmed applied this pass.
        applied: usize,
        /// Discarded as rejected this pass.
        rejected: usize,
        /// Still pending after this pass.
        retained: usize,
        /// Discarded at the attempt cap this pass.
        expired: usize,
    },
}
