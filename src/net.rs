//! Connectivity monitor: turns a raw reachability signal into edge-triggered
//! replay.
//!
//! The platform boundary is a `tokio::sync::watch` channel carrying
//! [`ConnectivityState`]. The embedding app owns the sender and feeds it raw
//! notifications; this task subscribes once and holds the receiver for its
//! whole life, so dropping the sender (or shutting the runtime down) is what
//! releases the subscription.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::runtime::handle::OutboxHandle;
use crate::types::ConnectivityState;

/// Spawns the monitor task.
///
/// Replay fires only on the rising edge into "connected and reachable":
/// redundant "still online" notifications are absorbed here rather than
/// wasting requests or stacking replay runs. The state observed at subscribe
/// time counts as a rising edge when it is already online, which drains any
/// queue left over from a previous session at startup.
pub fn spawn_connectivity_monitor(
    mut signal: watch::Receiver<ConnectivityState>,
    handle: OutboxHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut online = signal.borrow_and_update().is_online();
        if online {
            debug!("online at subscribe, triggering replay");
            handle.trigger_replay();
        }

        loop {
            if signal.changed().await.is_err() {
                debug!("connectivity signal closed, monitor exiting");
                break;
            }
            let state = *signal.borrow_and_update();
            let was_online = online;
            online = state.is_online();

            if online && !was_online {
                debug!(?state, "connectivity restored, triggering replay");
                handle.trigger_replay();
            }
        }
    })
}
