//! Backend profile handed to the proxy core.
//!
//! The profile is the slice of [`Config`](crate::Config) that describes one
//! execution backend: where it lives, how wide its identifiers are, and how
//! long a result query may wait for a completion notification.

use std::time::Duration;

/// Connection and correlation settings for a single ledger backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    /// Endpoint used for reads and submissions.
    pub ledger_provider: Option<String>,
    /// Endpoint used for completion-event subscriptions.
    pub event_provider: Option<String>,
    /// Address of the work order registry on the ledger.
    pub registry_address: Option<String>,
    /// Width of work order, worker, and requester identifiers in bytes.
    pub identifier_bytes: usize,
    /// Hard upper bound on a single get-result wait.
    pub result_timeout: Duration,
}

impl BackendProfile {
    /// Number of hex characters an identifier must carry.
    #[must_use]
    pub const fn identifier_hex_len(&self) -> usize {
        self.identifier_bytes.saturating_mul(2)
    }
}
