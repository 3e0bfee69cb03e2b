//! Shared primitive types for queued mutations and connectivity.

use serde::{Deserialize, Serialize};

/// Opaque record identifier, unique within one device's queue lifetime.
pub type RecordId = String;

/// HTTP verb a queued mutation maps onto.
///
/// The queue only ever carries writes; reads are served from local caches and
/// never buffered, so there is no `Get` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Create a resource.
    Post,
    /// Replace or upsert a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Uppercase wire form of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the platform connectivity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    /// Whether a network interface is up.
    pub is_connected: bool,
    /// Whether the wider internet is reachable over that interface.
    pub is_internet_reachable: bool,
}

impl ConnectivityState {
    /// True only when both connected and reachable; the replay trigger fires
    /// on the rising edge into this state.
    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable
    }

    /// Fully offline state.
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: false,
        }
    }
}

impl Default for ConnectivityState {
    /// Optimistic default: when the platform signal is unavailable the app
    /// must not permanently believe itself offline. Wasted attempts fall back
    /// to the replay retry policy.
    fn default() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: true,
        }
    }
}
