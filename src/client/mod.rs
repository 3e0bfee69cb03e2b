//! Outbound request transport abstraction and the reqwest implementation.

pub mod http;

use crate::types::Method;

/// A single replay request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Verb to issue.
    pub method: Method,
    /// Server-relative path.
    pub target: String,
    /// JSON body, if any.
    pub payload: Option<serde_json::Value>,
    /// Bearer token attached as `Authorization: Bearer <token>`.
    pub bearer: String,
}

/// A response actually produced by the server.
///
/// Any status here is authoritative: the request reached the server and must
/// not be blindly retried by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// HTTP status code.
    pub status: u16,
}

impl SendOutcome {
    /// The server accepted and applied the mutation.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The server rejected the request as invalid; retrying unchanged cannot
    /// succeed.
    pub fn is_rejection(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Failures that never carried a server response.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The request timed out before a response arrived.
    Timeout,
    /// Connection-level failure (DNS, refused, reset, offline).
    Network(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout => f.write_str("request timed out"),
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
        }
    }
}

/// Blocking transport seam between the replay policy and the HTTP stack.
///
/// Implementations run on blocking threads (`spawn_blocking` from the
/// runtime), mirroring how the persistence sink is driven. Tests substitute
/// scripted transports here.
pub trait ApiTransport: Send {
    /// Issues one authenticated request and reports either the server's
    /// verdict or the absence of one.
    fn send(&mut self, request: &OutboundRequest) -> Result<SendOutcome, TransportError>;
}
