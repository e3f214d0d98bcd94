//! Ledger backend abstraction.
//!
//! The proxy talks to exactly one [`LedgerBackend`]. Submissions and reads
//! are synchronous calls; completion notifications arrive asynchronously on
//! a [`Subscription`] channel. The in-memory [`memory::InMemoryLedger`] is the
//! reference implementation used by the daemon and by tests.

pub mod memory;

use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, trace};

use crate::work_order::WorkOrderId;

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");

/// Trait abstracting the ledger holding work orders and their results.
///
/// Implementations must be shareable across tasks; the proxy holds them
/// behind an `Arc`.
pub trait LedgerBackend: Send + Sync {
    /// Records a ledger operation and returns its receipt.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the operation could not be sent.
    fn submit(&self, operation: &LedgerOperation) -> Result<Receipt, BackendError>;

    /// Reads the response recorded for `work_order_id`.
    ///
    /// `Ok(None)` means no response has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the ledger cannot be read.
    fn read(&self, work_order_id: &WorkOrderId) -> Result<Option<String>, BackendError>;

    /// Opens a subscription for events of `kind`.
    ///
    /// Backends may use `filter` to narrow what they deliver; consumers
    /// still apply [`EventFilter::matches`] to every event received.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the subscription cannot be opened.
    fn subscribe(&self, kind: EventKind, filter: EventFilter)
    -> Result<Subscription, BackendError>;

    /// Closes the subscription identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the subscription cannot be closed.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BackendError>;
}

/// A state-changing ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Registers a new work order.
    Submit {
        /// Correlation key.
        work_order_id: WorkOrderId,
        /// Worker expected to execute the order.
        worker_id: String,
        /// Requester that issued the order.
        requester_id: String,
        /// Serialised request parameters.
        request: String,
    },
    /// Records the response of a finished work order.
    Complete {
        /// Correlation key.
        work_order_id: WorkOrderId,
        /// Serialised response payload.
        response: String,
    },
}

impl LedgerOperation {
    /// Identifier the operation targets.
    #[must_use]
    pub const fn work_order_id(&self) -> &WorkOrderId {
        match self {
            Self::Submit { work_order_id, .. } | Self::Complete { work_order_id, .. } => {
                work_order_id
            }
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Complete { .. } => "complete",
        }
    }
}

/// Synchronous acknowledgement of a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Backend transaction reference.
    pub transaction: String,
    /// Status flag reported by the backend, if any.
    pub status: Option<u64>,
}

impl Receipt {
    /// Flag value signalling that the operation took effect.
    pub const SUCCESS_FLAG: u64 = 1;

    /// Flag value signalling that the operation was rejected.
    pub const FAILURE_FLAG: u64 = 0;

    /// Builds a receipt.
    #[must_use]
    pub fn new(transaction: impl Into<String>, status: Option<u64>) -> Self {
        Self {
            transaction: transaction.into(),
            status,
        }
    }
}

/// Kinds of events a backend publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A work order response was recorded.
    WorkOrderCompleted,
}

impl EventKind {
    /// Event name as published by the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkOrderCompleted => "workOrderCompleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered on a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    kind: EventKind,
    work_order_id: Option<Vec<u8>>,
    response: String,
}

impl CompletionEvent {
    /// Builds an event. `work_order_id` is the raw binary identifier.
    #[must_use]
    pub fn new(kind: EventKind, work_order_id: Option<Vec<u8>>, response: impl Into<String>) -> Self {
        Self {
            kind,
            work_order_id,
            response: response.into(),
        }
    }

    /// Kind of the event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Binary identifier, when the event carries one.
    #[must_use]
    pub fn work_order_id(&self) -> Option<&[u8]> {
        self.work_order_id.as_deref()
    }

    /// Serialised response embedded in the event.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }
}

/// Predicate selecting the events one caller waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    kind: EventKind,
    work_order_id: WorkOrderId,
}

impl EventFilter {
    /// Builds a filter for `kind` events about `work_order_id`.
    #[must_use]
    pub const fn new(kind: EventKind, work_order_id: WorkOrderId) -> Self {
        Self {
            kind,
            work_order_id,
        }
    }

    /// Kind the filter accepts.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Identifier the filter accepts.
    #[must_use]
    pub const fn work_order_id(&self) -> &WorkOrderId {
        &self.work_order_id
    }

    /// Returns `true` when `event` concerns the filtered work order.
    ///
    /// An event without an identifier never matches and is logged as an
    /// error.
    #[must_use]
    pub fn matches(&self, event: &CompletionEvent) -> bool {
        if event.kind() != self.kind {
            trace!(
                target: BACKEND_TARGET,
                expected = %self.kind,
                actual = %event.kind(),
                "event kind does not match filter"
            );
            return false;
        }
        let Some(bytes) = event.work_order_id() else {
            error!(
                target: BACKEND_TARGET,
                kind = %event.kind(),
                "event carries no work order identifier"
            );
            return false;
        };
        self.work_order_id.matches_bytes(bytes)
    }
}

/// Identifier of an open subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// An open event stream.
///
/// The stream ends when the backend drops its sending half.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    events: UnboundedReceiver<CompletionEvent>,
}

impl Subscription {
    /// Pairs an identifier with its event receiver.
    #[must_use]
    pub const fn new(id: SubscriptionId, events: UnboundedReceiver<CompletionEvent>) -> Self {
        Self { id, events }
    }

    /// Identifier to pass to [`LedgerBackend::unsubscribe`].
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event; `None` once the stream has closed.
    pub async fn next_event(&mut self) -> Option<CompletionEvent> {
        self.events.recv().await
    }
}

/// Errors raised by ledger backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend cannot be reached or its state is unusable.
    #[error("ledger backend unavailable: {message}")]
    Unavailable {
        /// Human-readable failure description.
        message: String,
    },

    /// The backend rejected or failed a transaction.
    #[error("ledger transaction failed: {message}")]
    Transaction {
        /// Human-readable failure description.
        message: String,
    },

    /// A subscription could not be opened or closed.
    #[error("ledger subscription failed: {message}")]
    Subscription {
        /// Human-readable failure description.
        message: String,
    },

    /// Data read from the backend could not be decoded.
    #[error("ledger data could not be decoded: {message}")]
    Decode {
        /// Human-readable failure description.
        message: String,
    },
}

impl BackendError {
    /// Builds a [`BackendError::Unavailable`].
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Builds a [`BackendError::Transaction`].
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Builds a [`BackendError::Subscription`].
    #[must_use]
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }

    /// Builds a [`BackendError::Decode`].
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
