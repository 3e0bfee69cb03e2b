use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    client::ApiTransport,
    record::MutationRecord,
    replay::{PassOutcome, RecordOutcome, replay_pass},
    store::{QueueStore, StoreError},
    types::{Method, RecordId},
};

use super::events::OutboxEvent;

/// Errors surfaced by runtime operations.
///
/// Call sites on the offline fallback path are free to ignore these; nothing
/// here panics or escalates on its own.
#[derive(Debug)]
pub enum RuntimeError {
    /// Durable store failure.
    Store(StoreError),
    /// The runtime loop has shut down.
    ChannelClosed,
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Runtime tuning knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command channel feeding the runtime loop.
    pub command_queue_bound: usize,
    /// Capacity of the broadcast event channel.
    pub events_capacity: usize,
    /// Transient-failure attempt cap per record; `0` disables the cap and
    /// restores unbounded retries.
    pub max_attempts: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            events_capacity: 1024,
            max_attempts: 8,
        }
    }
}

/// Summary of one replay invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Records loaded for the pass.
    pub attempted: usize,
    /// Confirmed applied and removed.
    pub applied: usize,
    /// Rejected by the server and removed.
    pub rejected: usize,
    /// Still pending after the pass.
    pub retained: usize,
    /// Removed at the attempt cap.
    pub expired: usize,
    /// True when the pass aborted because no credential was stored.
    pub skipped_no_auth: bool,
}

/// Cloneable handle to the outbox runtime.
pub struct OutboxHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<OutboxEvent>,
}

impl Clone for OutboxHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Enqueue {
        method: Method,
        target: String,
        payload: Option<serde_json::Value>,
        resp: oneshot::Sender<Result<RecordId, RuntimeError>>,
    },
    Process {
        resp: Option<oneshot::Sender<Result<ReplayReport, RuntimeError>>>,
    },
    Pending {
        resp: oneshot::Sender<Result<Vec<MutationRecord>, RuntimeError>>,
    },
    PutToken {
        token: Option<String>,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer runtime loop and returns its handle.
///
/// The loop owns the store and transport and handles one command at a time,
/// which is what serializes replay runs: a trigger arriving while a run is in
/// flight is handled after it, against a freshly loaded snapshot. Enqueues
/// racing a run are likewise ordered through the same loop, so no append can
/// be clobbered by a concurrent save.
pub fn spawn_outbox(
    store: Box<dyn QueueStore>,
    transport: Box<dyn ApiTransport>,
    config: RuntimeConfig,
) -> OutboxHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<OutboxEvent>(config.events_capacity);

    let store = Arc::new(Mutex::new(store));
    let transport = Arc::new(Mutex::new(transport));
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            let done = handle_command(cmd, &store, &transport, &events_tx_loop, &config).await;
            if done {
                break;
            }
        }
    });

    OutboxHandle { cmd_tx, events_tx }
}

impl OutboxHandle {
    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboxEvent> {
        self.events_tx.subscribe()
    }

    /// Durably appends a mutation to the queue and returns its id.
    ///
    /// Resolves only after the record is persisted; once this returns, the
    /// record survives process restarts.
    pub async fn enqueue(
        &self,
        method: Method,
        target: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Result<RecordId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Enqueue {
                method,
                target: target.into(),
                payload,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Runs one replay pass and reports what happened.
    pub async fn process(&self) -> Result<ReplayReport, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Process { resp: Some(tx) })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Fire-and-forget replay trigger for the connectivity monitor.
    ///
    /// Never blocks the caller and never reports completion. If the command
    /// queue is full a trigger is simply dropped; pending work is picked up
    /// by the next trigger.
    pub fn trigger_replay(&self) {
        if self.cmd_tx.try_send(Command::Process { resp: None }).is_err() {
            debug!("replay trigger dropped, runtime busy or gone");
        }
    }

    /// Returns the persisted pending queue in enqueue order.
    pub async fn pending(&self) -> Result<Vec<MutationRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Pending { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stores or clears the bearer credential used by replay passes.
    pub async fn put_auth_token(&self, token: Option<String>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PutToken { token, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops the runtime loop after in-flight commands complete.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    store: &Arc<Mutex<Box<dyn QueueStore>>>,
    transport: &Arc<Mutex<Box<dyn ApiTransport>>>,
    events_tx: &broadcast::Sender<OutboxEvent>,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::Enqueue {
            method,
            target,
            payload,
            resp,
        } => {
            let res = enqueue_record(store, method, target, payload).await;
            if let Ok(id) = &res {
                let _ = events_tx.send(OutboxEvent::Enqueued { id: id.clone() });
            }
            let _ = resp.send(res);
        }
        Command::Process { resp } => {
            let res = run_replay(store, transport, events_tx, config).await;
            if let Some(resp) = resp {
                let _ = resp.send(res);
            } else if let Err(err) = res {
                warn!(error = ?err, "triggered replay pass failed");
            }
        }
        Command::Pending { resp } => {
            let store_ref = Arc::clone(store);
            let res = run_blocking(move || {
                let mut store = store_ref.blocking_lock();
                store.load()
            })
            .await;
            let _ = resp.send(res);
        }
        Command::PutToken { token, resp } => {
            let store_ref = Arc::clone(store);
            let res = run_blocking(move || {
                let mut store = store_ref.blocking_lock();
                store.put_auth_token(token.as_deref())
            })
            .await;
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn enqueue_record(
    store: &Arc<Mutex<Box<dyn QueueStore>>>,
    method: Method,
    target: String,
    payload: Option<serde_json::Value>,
) -> Result<RecordId, RuntimeError> {
    let store_ref = Arc::clone(store);
    run_blocking(move || {
        let mut store = store_ref.blocking_lock();
        // Re-read the latest snapshot immediately before writing so an append
        // can never clobber records saved since the caller last looked.
        let mut records = store.load()?;
        let record = MutationRecord::new(method, target, payload);
        let id = record.id.clone();
        records.push(record);
        store.save(&records)?;
        Ok(id)
    })
    .await
}

async fn run_replay(
    store: &Arc<Mutex<Box<dyn QueueStore>>>,
    transport: &Arc<Mutex<Box<dyn ApiTransport>>>,
    events_tx: &broadcast::Sender<OutboxEvent>,
    config: &RuntimeConfig,
) -> Result<ReplayReport, RuntimeError> {
    let store_ref = Arc::clone(store);
    let (records, token) = run_blocking(move || {
        let mut store = store_ref.blocking_lock();
        let records = store.load()?;
        let token = store.auth_token()?;
        Ok((records, token))
    })
    .await?;

    if records.is_empty() {
        return Ok(ReplayReport::default());
    }

    let Some(token) = token else {
        // An unauthenticated replay is meaningless; leave the queue intact.
        warn!(pending = records.len(), "no stored credential, skipping replay pass");
        let _ = events_tx.send(OutboxEvent::ReplaySkippedNoAuth);
        return Ok(ReplayReport {
            attempted: records.len(),
            retained: records.len(),
            skipped_no_auth: true,
            ..ReplayReport::default()
        });
    };

    let attempted = records.len();
    let _ = events_tx.send(OutboxEvent::ReplayStarted { pending: attempted });

    let store_ref = Arc::clone(store);
    let transport_ref = Arc::clone(transport);
    let max_attempts = config.max_attempts;
    let outcome = run_blocking(move || {
        let mut transport = transport_ref.blocking_lock();
        let outcome = replay_pass(records, transport.as_mut(), &token, max_attempts);
        // One save for the whole pass. A crash before this line re-delivers
        // already-applied requests next run; it never loses retained records.
        let mut store = store_ref.blocking_lock();
        store.save(&outcome.retained)?;
        Ok(outcome)
    })
    .await?;

    let report = publish_outcome(events_tx, attempted, &outcome);
    Ok(report)
}

fn publish_outcome(
    events_tx: &broadcast::Sender<OutboxEvent>,
    attempted: usize,
    outcome: &PassOutcome,
) -> ReplayReport {
    let mut report = ReplayReport {
        attempted,
        retained: outcome.retained.len(),
        ..ReplayReport::default()
    };

    for (id, fate) in &outcome.outcomes {
        let event = match fate {
            RecordOutcome::Applied { status } => {
                report.applied += 1;
                OutboxEvent::RecordApplied {
                    id: id.clone(),
                    status: *status,
                }
            }
            RecordOutcome::Rejected { status } => {
                report.rejected += 1;
                OutboxEvent::RecordRejected {
                    id: id.clone(),
                    status: *status,
                }
            }
            RecordOutcome::Retained => OutboxEvent::RecordRetained { id: id.clone() },
            RecordOutcome::Expired => {
                report.expired += 1;
                OutboxEvent::RecordExpired { id: id.clone() }
            }
        };
        let _ = events_tx.send(event);
    }

    let _ = events_tx.send(OutboxEvent::ReplayFinished {
        applied: report.applied,
        rejected: report.rejected,
        retained: report.retained,
        expired: report.expired,
    });
    report
}

async fn run_blocking<T, F>(f: F) -> Result<T, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(inner) => inner.map_err(RuntimeError::from),
        Err(e) => Err(RuntimeError::Store(StoreError::Message(format!(
            "join error: {e}"
        )))),
    }
}
