//! Correlation of work order identifiers with their results.
//!
//! A lookup first reads the ledger directly. When no result is recorded it
//! opens one completion subscription, reads once more to close the race
//! with a completion landing in between, and then waits for a matching
//! event under a hard timeout. Whatever the exit path, the subscription is
//! closed exactly once by [`SubscriptionGuard`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use crate::backend::{
    BackendError, CompletionEvent, EventFilter, EventKind, LedgerBackend, Subscription,
};
use crate::envelope::RequestId;
use crate::error::ProxyError;
use crate::validation::ArgumentValidator;
use crate::work_order::{WorkOrderId, WorkOrderResult};

const CORRELATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::correlator");

/// Terminal state of one correlation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationOutcome {
    /// The result was already recorded when the ledger was read.
    Direct(WorkOrderResult),
    /// A matching completion event arrived within the timeout.
    Matched(WorkOrderResult),
    /// No matching event arrived within the timeout.
    TimedOut,
    /// A read, subscription, or decode fault ended the attempt.
    Errored,
}

impl CorrelationOutcome {
    /// Yields the result, if the attempt produced one.
    #[must_use]
    pub fn into_result(self) -> Option<WorkOrderResult> {
        match self {
            Self::Direct(result) | Self::Matched(result) => Some(result),
            Self::TimedOut | Self::Errored => None,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Matched(_) => "matched",
            Self::TimedOut => "timed_out",
            Self::Errored => "errored",
        }
    }
}

/// Closes a subscription when dropped.
///
/// Dropping covers early returns, timeouts, and the enclosing future being
/// abandoned mid-wait.
pub struct SubscriptionGuard<B>
where
    B: LedgerBackend + ?Sized,
{
    backend: Arc<B>,
    subscription: Subscription,
}

impl<B> SubscriptionGuard<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Takes ownership of `subscription`, opened on `backend`.
    #[must_use]
    pub const fn new(backend: Arc<B>, subscription: Subscription) -> Self {
        Self {
            backend,
            subscription,
        }
    }

    /// The guarded subscription.
    pub const fn subscription_mut(&mut self) -> &mut Subscription {
        &mut self.subscription
    }
}

impl<B> Drop for SubscriptionGuard<B>
where
    B: LedgerBackend + ?Sized,
{
    fn drop(&mut self) {
        let id = self.subscription.id();
        match self.backend.unsubscribe(id) {
            Ok(()) => trace!(target: CORRELATOR_TARGET, subscription = %id, "unsubscribed"),
            Err(fault) => warn!(
                target: CORRELATOR_TARGET,
                subscription = %id,
                error = %fault,
                "failed to close subscription"
            ),
        }
    }
}

/// Retrieves work order results from a ledger backend.
#[derive(Debug)]
pub struct ResultCorrelator<B: ?Sized> {
    backend: Arc<B>,
    identifier_hex_len: usize,
    timeout: Duration,
}

impl<B: ?Sized> Clone for ResultCorrelator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            identifier_hex_len: self.identifier_hex_len,
            timeout: self.timeout,
        }
    }
}

impl<B> ResultCorrelator<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Creates a correlator waiting at most `timeout` for completion events.
    #[must_use]
    pub const fn new(backend: Arc<B>, identifier_hex_len: usize, timeout: Duration) -> Self {
        Self {
            backend,
            identifier_hex_len,
            timeout,
        }
    }

    /// Default wait applied by [`Self::get_result`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Looks up the result of `work_order_id` using the default timeout.
    ///
    /// `Ok(None)` means no result was available: the wait timed out or the
    /// backend failed. Both are logged.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when
    /// `work_order_id` is not hex of the configured width.
    pub async fn get_result(
        &self,
        work_order_id: &str,
        request_id: &RequestId,
    ) -> Result<Option<WorkOrderResult>, ProxyError> {
        self.get_result_within(work_order_id, request_id, self.timeout)
            .await
    }

    /// Looks up the result of `work_order_id`, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when
    /// `work_order_id` is not hex of the configured width.
    pub async fn get_result_within(
        &self,
        work_order_id: &str,
        request_id: &RequestId,
        timeout: Duration,
    ) -> Result<Option<WorkOrderResult>, ProxyError> {
        ArgumentValidator::require_hex_of_length(
            request_id,
            self.identifier_hex_len,
            [("work_order_id", work_order_id)],
        )?;
        let id = WorkOrderId::new(work_order_id);
        let outcome = self.correlate(&id, timeout).await;
        debug!(
            target: CORRELATOR_TARGET,
            work_order_id = %id,
            outcome = outcome.name(),
            "result lookup finished"
        );
        Ok(outcome.into_result())
    }

    /// Runs one correlation attempt for an already validated identifier.
    pub async fn correlate(&self, id: &WorkOrderId, timeout: Duration) -> CorrelationOutcome {
        match self.read_direct(id) {
            Ok(Some(result)) => return CorrelationOutcome::Direct(result),
            Ok(None) => {}
            Err(fault) => return errored(id, &fault),
        }

        let filter = EventFilter::new(EventKind::WorkOrderCompleted, id.clone());
        let subscription = match self
            .backend
            .subscribe(EventKind::WorkOrderCompleted, filter.clone())
        {
            Ok(subscription) => subscription,
            Err(fault) => return errored(id, &fault),
        };
        let mut guard = SubscriptionGuard::new(Arc::clone(&self.backend), subscription);
        trace!(
            target: CORRELATOR_TARGET,
            work_order_id = %id,
            subscription = %guard.subscription_mut().id(),
            "awaiting completion"
        );

        match self.read_direct(id) {
            Ok(Some(result)) => return CorrelationOutcome::Direct(result),
            Ok(None) => {}
            Err(fault) => return errored(id, &fault),
        }

        match tokio::time::timeout(timeout, next_match(guard.subscription_mut(), &filter)).await {
            Ok(Some(event)) => match WorkOrderResult::decode(id.clone(), event.response()) {
                Ok(result) => CorrelationOutcome::Matched(result),
                Err(decode_error) => errored(id, &BackendError::decode(decode_error.to_string())),
            },
            Ok(None) => errored(id, &BackendError::subscription("event stream closed")),
            Err(_elapsed) => {
                warn!(
                    target: CORRELATOR_TARGET,
                    work_order_id = %id,
                    timeout_secs = timeout.as_secs(),
                    "no result before timeout; the work order id may be invalid or the work order is incomplete"
                );
                CorrelationOutcome::TimedOut
            }
        }
    }

    fn read_direct(&self, id: &WorkOrderId) -> Result<Option<WorkOrderResult>, BackendError> {
        let Some(raw) = self.backend.read(id)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        WorkOrderResult::decode(id.clone(), &raw)
            .map(Some)
            .map_err(|decode_error| BackendError::decode(decode_error.to_string()))
    }
}

async fn next_match(
    subscription: &mut Subscription,
    filter: &EventFilter,
) -> Option<CompletionEvent> {
    while let Some(event) = subscription.next_event().await {
        if filter.matches(&event) {
            return Some(event);
        }
        trace!(
            target: CORRELATOR_TARGET,
            awaiting = %filter.work_order_id(),
            "skipping unrelated completion event"
        );
    }
    None
}

fn errored(id: &WorkOrderId, fault: &BackendError) -> CorrelationOutcome {
    error!(
        target: CORRELATOR_TARGET,
        work_order_id = %id,
        error = %fault,
        "result lookup failed"
    );
    CorrelationOutcome::Errored
}
