//! In-memory ledger backend.
//!
//! Keeps every work order in a process-local table and fans completion
//! events out to live subscriptions over unbounded tokio channels. Nothing
//! survives a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use super::{
    BackendError, CompletionEvent, EventFilter, EventKind, LedgerBackend, LedgerOperation,
    Receipt, Subscription, SubscriptionId,
};
use crate::work_order::WorkOrderId;

const MEMORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend::memory");

#[derive(Debug)]
struct LedgerEntry {
    worker_id: String,
    requester_id: String,
    response: Option<String>,
}

#[derive(Debug)]
struct Subscriber {
    kind: EventKind,
    filter: EventFilter,
    sender: UnboundedSender<CompletionEvent>,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: HashMap<WorkOrderId, LedgerEntry>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
}

/// Process-local [`LedgerBackend`].
///
/// Submitting an identifier twice, or completing an identifier that was
/// never submitted or is already complete, yields a receipt carrying
/// [`Receipt::FAILURE_FLAG`].
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    next_subscription: AtomicU64,
    next_transaction: AtomicU64,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions not yet closed.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state
            .lock()
            .map_or(0, |state| state.subscribers.len())
    }

    #[cfg(test)]
    pub(crate) fn work_order_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    #[cfg(test)]
    pub(crate) fn parties(
        &self,
        work_order_id: &WorkOrderId,
    ) -> Result<Option<(String, String)>, BackendError> {
        let state = self.lock()?;
        Ok(state
            .entries
            .get(work_order_id)
            .map(|entry| (entry.worker_id.clone(), entry.requester_id.clone())))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::unavailable("ledger state lock poisoned"))
    }

    fn receipt(&self, succeeded: bool) -> Receipt {
        let sequence = self.next_transaction.fetch_add(1, Ordering::Relaxed);
        let flag = if succeeded {
            Receipt::SUCCESS_FLAG
        } else {
            Receipt::FAILURE_FLAG
        };
        Receipt::new(format!("0x{sequence:016x}"), Some(flag))
    }

    fn record_submit(
        &self,
        state: &mut LedgerState,
        work_order_id: &WorkOrderId,
        worker_id: &str,
        requester_id: &str,
        request: &str,
    ) -> Receipt {
        if state.entries.contains_key(work_order_id) {
            warn!(
                target: MEMORY_TARGET,
                work_order_id = %work_order_id,
                "work order already submitted"
            );
            return self.receipt(false);
        }
        state.entries.insert(
            work_order_id.clone(),
            LedgerEntry {
                worker_id: worker_id.to_owned(),
                requester_id: requester_id.to_owned(),
                response: None,
            },
        );
        debug!(
            target: MEMORY_TARGET,
            work_order_id = %work_order_id,
            request_bytes = request.len(),
            "work order recorded"
        );
        self.receipt(true)
    }

    fn record_complete(
        &self,
        state: &mut LedgerState,
        work_order_id: &WorkOrderId,
        response: &str,
    ) -> Receipt {
        let Some(entry) = state.entries.get_mut(work_order_id) else {
            warn!(
                target: MEMORY_TARGET,
                work_order_id = %work_order_id,
                "completion for unknown work order"
            );
            return self.receipt(false);
        };
        if entry.response.is_some() {
            warn!(
                target: MEMORY_TARGET,
                work_order_id = %work_order_id,
                "work order already completed"
            );
            return self.receipt(false);
        }
        entry.response = Some(response.to_owned());

        let event = CompletionEvent::new(
            EventKind::WorkOrderCompleted,
            work_order_id.to_bytes().ok(),
            response,
        );
        debug!(
            target: MEMORY_TARGET,
            work_order_id = %work_order_id,
            worker_id = %entry.worker_id,
            requester_id = %entry.requester_id,
            "work order completed"
        );
        publish(state, &event);
        self.receipt(true)
    }
}

/// Delivers `event` to every subscriber of its kind.
///
/// Filters are advisory here; receivers still check each event. A closed
/// receiver is skipped and stays registered until it is unsubscribed.
fn publish(state: &LedgerState, event: &CompletionEvent) {
    for (id, subscriber) in &state.subscribers {
        if subscriber.kind != event.kind() {
            continue;
        }
        if subscriber.sender.send(event.clone()).is_err() {
            debug!(
                target: MEMORY_TARGET,
                subscription = %id,
                awaiting = %subscriber.filter.work_order_id(),
                "subscriber receiver already closed"
            );
        }
    }
}

impl LedgerBackend for InMemoryLedger {
    fn submit(&self, operation: &LedgerOperation) -> Result<Receipt, BackendError> {
        let mut state = self.lock()?;
        let receipt = match operation {
            LedgerOperation::Submit {
                work_order_id,
                worker_id,
                requester_id,
                request,
            } => self.record_submit(&mut state, work_order_id, worker_id, requester_id, request),
            LedgerOperation::Complete {
                work_order_id,
                response,
            } => self.record_complete(&mut state, work_order_id, response),
        };
        Ok(receipt)
    }

    fn read(&self, work_order_id: &WorkOrderId) -> Result<Option<String>, BackendError> {
        let state = self.lock()?;
        Ok(state
            .entries
            .get(work_order_id)
            .and_then(|entry| entry.response.clone()))
    }

    fn subscribe(
        &self,
        kind: EventKind,
        filter: EventFilter,
    ) -> Result<Subscription, BackendError> {
        let mut state = self.lock()?;
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(
            target: MEMORY_TARGET,
            subscription = %id,
            kind = %kind,
            work_order_id = %filter.work_order_id(),
            "subscription opened"
        );
        state.subscribers.insert(
            id,
            Subscriber {
                kind,
                filter,
                sender,
            },
        );
        Ok(Subscription::new(id, receiver))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        if state.subscribers.remove(&id).is_none() {
            return Err(BackendError::subscription(format!(
                "subscription {id} is not open"
            )));
        }
        debug!(target: MEMORY_TARGET, subscription = %id, "subscription closed");
        Ok(())
    }
}
