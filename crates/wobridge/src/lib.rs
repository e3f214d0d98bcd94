//! Work order proxy core for `wobridge`.
//!
//! The crate bridges a JSON-RPC work order protocol onto a ledger backend.
//! Clients submit work orders, workers record their responses, and clients
//! later fetch results. Fetching is the interesting part: a result may not
//! exist yet, so the [`ResultCorrelator`] waits for a completion event under
//! a hard timeout instead of polling.
//!
//! # Architecture
//!
//! - [`RequestValidator`] checks parameters against per-method JSON schemas.
//! - [`ArgumentValidator`] enforces identifier widths and endpoint shapes.
//! - [`SubmissionExecutor`] performs one ledger call per operation and maps
//!   the receipt onto a [`WorkOrderStatus`].
//! - [`ResultCorrelator`] reads, subscribes, and waits.
//! - [`WorkOrderProxy`] ties these together over one [`LedgerBackend`].
//!
//! Backend faults never escape as errors. Submissions downgrade them to
//! [`WorkOrderStatus::Failed`] and lookups downgrade them to "no result".
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use wobridge::{InMemoryLedger, ProxyError, RequestId, WorkOrderProxy};
//! use wobridge_config::BackendProfile;
//!
//! # async fn demo() -> Result<(), ProxyError> {
//! let profile = BackendProfile {
//!     ledger_provider: Some("http://127.0.0.1:8555".into()),
//!     event_provider: Some("ws://127.0.0.1:8556".into()),
//!     registry_address: Some("0x01".into()),
//!     identifier_bytes: 32,
//!     result_timeout: Duration::from_secs(30),
//! };
//! let proxy = WorkOrderProxy::new(&profile, Some(Arc::new(InMemoryLedger::new())))?;
//! let result = proxy
//!     .get_result(&"ab".repeat(32), &RequestId::from(1_u64))
//!     .await?;
//! assert!(result.is_none());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod correlator;
pub mod envelope;
pub mod error;
pub mod proxy;
pub mod status;
pub mod submission;
pub mod validation;
pub mod work_order;

#[cfg(test)]
mod test_support;

pub use self::backend::memory::InMemoryLedger;
pub use self::backend::{
    BackendError, CompletionEvent, EventFilter, EventKind, LedgerBackend, LedgerOperation,
    Receipt, Subscription, SubscriptionId,
};
pub use self::correlator::{CorrelationOutcome, ResultCorrelator, SubscriptionGuard};
pub use self::envelope::{
    ErrorEnvelope, ErrorObject, JSONRPC_VERSION, RequestId, ResultEnvelope,
};
pub use self::error::ProxyError;
pub use self::proxy::{Method, WorkOrderProxy};
pub use self::status::{UnknownStatusCode, WorkOrderStatus, map_submission};
pub use self::submission::SubmissionExecutor;
pub use self::validation::{ArgumentValidator, RequestValidator, SchemaRegistry};
pub use self::work_order::{WorkOrderId, WorkOrderRequest, WorkOrderResult};
