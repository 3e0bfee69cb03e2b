//! Replay policy: one FIFO pass over the pending queue.
//!
//! The pass is pure with respect to persistence: it consumes a loaded
//! snapshot and returns the subset to keep, so the caller decides when the
//! result becomes durable. A crash between the pass and the save re-delivers
//! already-applied requests on the next run (at-least-once delivery).

use tracing::{debug, info, warn};

use crate::client::{ApiTransport, OutboundRequest};
use crate::record::MutationRecord;
use crate::types::RecordId;

/// Terminal or non-terminal fate of one record within a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Server confirmed the mutation; record dropped.
    Applied {
        /// Response status.
        status: u16,
    },
    /// Server rejected the request as invalid (4xx); record dropped. Retrying
    /// an invalid request cannot succeed, and keeping it would block every
    /// record behind it.
    Rejected {
        /// Response status.
        status: u16,
    },
    /// Transient failure (5xx, timeout, no response); record kept for the
    /// next run.
    Retained,
    /// Transient failure, but the record hit the attempt cap; record dropped.
    Expired,
}

/// Result of one full pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Records to persist as the new queue, in original order.
    pub retained: Vec<MutationRecord>,
    /// Per-record fates, in replay order.
    pub outcomes: Vec<(RecordId, RecordOutcome)>,
}

impl PassOutcome {
    /// Count of records whose fate matches `pred`.
    pub fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Replays `records` in enqueue order through `transport`.
///
/// `max_attempts` bounds transient retries; `0` means unbounded, matching the
/// behavior this design was derived from. Every record gets exactly one
/// request this pass regardless of outcome ordering: a transient failure on
/// one record does not stop later records from being attempted.
pub fn replay_pass(
    records: Vec<MutationRecord>,
    transport: &mut dyn ApiTransport,
    bearer: &str,
    max_attempts: u32,
) -> PassOutcome {
    let mut out = PassOutcome::default();

    for mut record in records {
        let request = OutboundRequest {
            method: record.method,
            target: record.target.clone(),
            payload: record.payload.clone(),
            bearer: bearer.to_string(),
        };

        let outcome = match transport.send(&request) {
            Ok(response) if response.is_success() => {
                debug!(id = %record.id, method = %record.method, target_path = %record.target, status = response.status, "replayed");
                RecordOutcome::Applied {
                    status: response.status,
                }
            }
            Ok(response) if response.is_rejection() => {
                warn!(id = %record.id, method = %record.method, target_path = %record.target, status = response.status, "discarding rejected mutation");
                RecordOutcome::Rejected {
                    status: response.status,
                }
            }
            Ok(response) => {
                debug!(id = %record.id, status = response.status, "server error, keeping record");
                retain_or_expire(&mut record, max_attempts)
            }
            Err(err) => {
                debug!(id = %record.id, error = %err, "transport failure, keeping record");
                retain_or_expire(&mut record, max_attempts)
            }
        };

        let id = record.id.clone();
        if matches!(outcome, RecordOutcome::Retained) {
            out.retained.push(record);
        }
        out.outcomes.push((id, outcome));
    }

    info!(
        applied = out.count(|o| matches!(o, RecordOutcome::Applied { .. })),
        rejected = out.count(|o| matches!(o, RecordOutcome::Rejected { .. })),
        retained = out.retained.len(),
        expired = out.count(|o| matches!(o, RecordOutcome::Expired)),
        "replay pass complete"
    );
    out
}

fn retain_or_expire(record: &mut MutationRecord, max_attempts: u32) -> RecordOutcome {
    record.attempts = record.attempts.saturating_add(1);
    if max_attempts > 0 && record.attempts >= max_attempts {
        warn!(id = %record.id, attempts = record.attempts, "dropping record at attempt cap");
        RecordOutcome::Expired
    } else {
        RecordOutcome::Retained
    }
}
