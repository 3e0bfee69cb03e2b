//! Durable offline mutation outbox with connectivity-triggered replay.
//!
//! Writes made while offline are buffered as [`record::MutationRecord`]s in a
//! [`store::QueueStore`] snapshot, then replayed in FIFO order against the
//! remote API when connectivity returns. Replay drops confirmed and rejected
//! records and keeps transient failures for the next pass, giving
//! at-least-once delivery over an authenticated HTTP transport.
//!
//! # Examples
//!
//! Pure replay policy with a scripted transport:
//! ```
//! use outbox::{
//!     client::{ApiTransport, OutboundRequest, SendOutcome, TransportError},
//!     record::MutationRecord,
//!     replay::replay_pass,
//!     types::Method,
//! };
//!
//! struct AlwaysOk;
//!
//! impl ApiTransport for AlwaysOk {
//!     fn send(&mut self, _request: &OutboundRequest) -> Result<SendOutcome, TransportError> {
//!         Ok(SendOutcome { status: 200 })
//!     }
//! }
//!
//! let records = vec![
//!     MutationRecord::new(Method::Put, "/auth/me", Some(serde_json::json!({"name": "Alex"}))),
//! ];
//! let outcome = replay_pass(records, &mut AlwaysOk, "token", 8);
//! assert!(outcome.retained.is_empty());
//! ```
//!
//! Full runtime with SQLite storage and a live HTTP transport:
//! ```no_run
//! use outbox::{
//!     client::http::{HttpApiClient, HttpClientConfig},
//!     net::spawn_connectivity_monitor,
//!     runtime::handle::{RuntimeConfig, spawn_outbox},
//!     store::sqlite::SqliteQueueStore,
//!     types::{ConnectivityState, Method},
//! };
//! use tokio::sync::watch;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteQueueStore::open("outbox.db").expect("open store");
//! let transport = HttpApiClient::new(HttpClientConfig::new("https://api.example.com/api"))
//!     .expect("build client");
//! let handle = spawn_outbox(Box::new(store), Box::new(transport), RuntimeConfig::default());
//!
//! let (signal_tx, signal_rx) = watch::channel(ConnectivityState::offline());
//! let _monitor = spawn_connectivity_monitor(signal_rx, handle.clone());
//!
//! // Offline: buffer the edit instead of performing it.
//! let _id = handle
//!     .enqueue(Method::Put, "/auth/me", Some(serde_json::json!({"name": "Alex"})))
//!     .await
//!     .expect("enqueue");
//!
//! // Reconnect: the monitor triggers a replay pass.
//! let _ = signal_tx.send(ConnectivityState::default());
//! # }
//! ```
#![deny(missing_docs)]

/// Outbound transport seam and the reqwest implementation.
pub mod client;
/// Connectivity monitor with edge-triggered replay.
pub mod net;
/// Queued mutation data model.
pub mod record;
/// FIFO replay pass and failure classification.
pub mod replay;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Durable queue storage and the SQLite implementation.
pub mod store;
/// Shared primitive types and enums.
pub mod types;
