//! Work order status codes and submission outcome mapping.
//!
//! [`WorkOrderStatus`] is the closed vocabulary every response speaks. The
//! numeric values are a wire contract shared with existing clients and must
//! never be renumbered.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, Receipt};

/// Outcome codes reported to JSON-RPC clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
#[repr(u8)]
pub enum WorkOrderStatus {
    /// The operation completed.
    Success = 0,
    /// The operation failed.
    Failed = 1,
    /// A parameter was missing, malformed, or out of range.
    InvalidParameterFormatOrValue = 2,
    /// The requester may not perform the operation.
    AccessDenied = 3,
    /// A signature did not verify.
    InvalidSignature = 4,
    /// The work order has not produced a result yet.
    Pending = 5,
    /// The work order is queued for execution.
    Scheduled = 6,
    /// The work order is executing.
    Processing = 7,
    /// The worker cannot accept more work.
    Busy = 8,
    /// The workload is not recognised by the worker.
    InvalidWorkload = 9,
    /// Catch-all for faults without a more specific code.
    UnknownError = 10,
}

/// Raised when an integer does not name a [`WorkOrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{value} is not a work order status code")]
pub struct UnknownStatusCode {
    /// The rejected value.
    pub value: i64,
}

impl WorkOrderStatus {
    /// Every defined status in wire order.
    pub const ALL: [Self; 11] = [
        Self::Success,
        Self::Failed,
        Self::InvalidParameterFormatOrValue,
        Self::AccessDenied,
        Self::InvalidSignature,
        Self::Pending,
        Self::Scheduled,
        Self::Processing,
        Self::Busy,
        Self::InvalidWorkload,
        Self::UnknownError,
    ];

    /// Returns `true` when `value` is a defined status code.
    ///
    /// Codes are contiguous, so membership is a range check.
    #[must_use]
    pub const fn has_value(value: i64) -> bool {
        matches!(value, 0..=10)
    }

    /// Wire representation of the status.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in logs and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::InvalidParameterFormatOrValue => "INVALID_PARAMETER_FORMAT_OR_VALUE",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Pending => "PENDING",
            Self::Scheduled => "SCHEDULED",
            Self::Processing => "PROCESSING",
            Self::Busy => "BUSY",
            Self::InvalidWorkload => "INVALID_WORKLOAD",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WorkOrderStatus> for u8 {
    fn from(status: WorkOrderStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for WorkOrderStatus {
    type Error = UnknownStatusCode;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(UnknownStatusCode { value })
    }
}

/// Maps a backend submission outcome onto the status vocabulary.
///
/// A receipt carrying [`Receipt::SUCCESS_FLAG`] is a success; any other flag
/// is a failure, and a receipt without a flag is an unknown error. A backend
/// fault is a failure. This function never panics.
#[must_use]
pub fn map_submission(outcome: &Result<Receipt, BackendError>) -> WorkOrderStatus {
    match outcome {
        Ok(receipt) => match receipt.status {
            Some(Receipt::SUCCESS_FLAG) => WorkOrderStatus::Success,
            Some(_) => WorkOrderStatus::Failed,
            None => WorkOrderStatus::UnknownError,
        },
        Err(_) => WorkOrderStatus::Failed,
    }
}
