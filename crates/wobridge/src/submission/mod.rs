//! Ledger submissions for new and finished work orders.
//!
//! The executor validates identifiers, performs exactly one backend call,
//! and reports the outcome as a [`WorkOrderStatus`]. Backend faults are
//! logged and downgraded to [`WorkOrderStatus::Failed`]; they never reach
//! the caller as errors.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::backend::{LedgerBackend, LedgerOperation};
use crate::envelope::RequestId;
use crate::error::ProxyError;
use crate::status::{WorkOrderStatus, map_submission};
use crate::validation::ArgumentValidator;
use crate::work_order::{WorkOrderId, WorkOrderRequest};

const SUBMISSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::submission");

/// Sends work order operations to a ledger backend.
#[derive(Debug)]
pub struct SubmissionExecutor<B: ?Sized> {
    backend: Arc<B>,
    identifier_hex_len: usize,
}

impl<B: ?Sized> Clone for SubmissionExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            identifier_hex_len: self.identifier_hex_len,
        }
    }
}

impl<B> SubmissionExecutor<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Creates an executor expecting identifiers of `identifier_hex_len`
    /// hex characters.
    #[must_use]
    pub const fn new(backend: Arc<B>, identifier_hex_len: usize) -> Self {
        Self {
            backend,
            identifier_hex_len,
        }
    }

    /// Registers a new work order with the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when the work
    /// order, worker, or requester identifier is not hex of the configured
    /// width. The backend is not called in that case.
    pub fn submit(&self, request: &WorkOrderRequest) -> Result<WorkOrderStatus, ProxyError> {
        ArgumentValidator::require_hex_of_length(
            request.request_id(),
            self.identifier_hex_len,
            [
                ("work_order_id", request.raw_work_order_id()),
                ("worker_id", request.worker_id()),
                ("requester_id", request.requester_id()),
            ],
        )?;

        let operation = LedgerOperation::Submit {
            work_order_id: request.work_order_id(),
            worker_id: request.worker_id().to_ascii_lowercase(),
            requester_id: request.requester_id().to_ascii_lowercase(),
            request: request.payload().to_string(),
        };
        Ok(self.send(&operation))
    }

    /// Records the response of a finished work order.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when
    /// `work_order_id` is not hex of the configured width. The backend is
    /// not called in that case.
    pub fn complete(
        &self,
        work_order_id: &str,
        response: &Value,
        request_id: &RequestId,
    ) -> Result<WorkOrderStatus, ProxyError> {
        ArgumentValidator::require_hex_of_length(
            request_id,
            self.identifier_hex_len,
            [("work_order_id", work_order_id)],
        )?;

        let operation = LedgerOperation::Complete {
            work_order_id: WorkOrderId::new(work_order_id),
            response: response.to_string(),
        };
        Ok(self.send(&operation))
    }

    fn send(&self, operation: &LedgerOperation) -> WorkOrderStatus {
        let outcome = self.backend.submit(operation);
        if let Err(fault) = &outcome {
            error!(
                target: SUBMISSION_TARGET,
                operation = operation.name(),
                work_order_id = %operation.work_order_id(),
                error = %fault,
                "ledger operation failed"
            );
        }
        let status = map_submission(&outcome);
        debug!(
            target: SUBMISSION_TARGET,
            operation = operation.name(),
            work_order_id = %operation.work_order_id(),
            status = %status,
            "ledger operation finished"
        );
        status
    }
}

#[cfg(test)]
mod tests;
