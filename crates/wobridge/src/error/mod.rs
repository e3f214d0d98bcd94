//! Domain errors raised by proxy operations.
//!
//! Every variant carries the structured context a caller needs to build a
//! JSON-RPC error reply. [`ProxyError::status`] names the wire status and
//! [`ProxyError::to_envelope`] renders the reply itself.

use serde_json::Value;
use thiserror::Error;

use crate::envelope::{ErrorEnvelope, RequestId};
use crate::status::WorkOrderStatus;

/// Summary text shared by every parameter failure.
pub const INVALID_PARAMETER_MESSAGE: &str = "Invalid parameter format or value";

/// Summary text for methods the backend does not implement.
pub const UNSUPPORTED_MESSAGE: &str = "Operation is not supported by this backend";

/// Summary text for a work order without a result.
pub const RESULT_UNAVAILABLE_MESSAGE: &str = "Work order result is not available";

/// Errors arising from proxy operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// A request parameter was missing, malformed, or out of range.
    #[error("{message}: {data}")]
    InvalidParameterFormatOrValue {
        /// Correlation id of the offending request, when known.
        request_id: Option<RequestId>,
        /// Summary text.
        message: String,
        /// Diagnostic naming the offending value.
        data: String,
    },

    /// A required collaborator of the proxy is absent.
    #[error("contract failed: {message}")]
    ContractFailed {
        /// Description of the missing collaborator.
        message: String,
    },

    /// A backend endpoint is absent or not a usable URL.
    #[error("proxy provider missing or invalid: {message}")]
    ProxyProviderMissingOrInvalid {
        /// Description of the rejected endpoint.
        message: String,
    },

    /// No request schema is registered for the method.
    #[error("no schema registered for method '{method}'")]
    SchemaNotRegistered {
        /// Method that was looked up.
        method: String,
    },

    /// No result arrived within the configured bound.
    #[error("work order {work_order_id} produced no result within {timeout_secs}s")]
    Timeout {
        /// Identifier that was awaited.
        work_order_id: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The method is part of the protocol but this backend does not serve it.
    #[error("method '{method}' is not supported by this backend")]
    Unsupported {
        /// Rejected method name.
        method: String,
    },

    /// A fault without a more specific classification.
    #[error("unknown error: {message}")]
    UnknownError {
        /// Human-readable failure description.
        message: String,
    },
}

impl ProxyError {
    /// Builds a parameter failure with the standard summary text.
    #[must_use]
    pub fn invalid_parameter(request_id: Option<RequestId>, data: impl Into<String>) -> Self {
        Self::InvalidParameterFormatOrValue {
            request_id,
            message: INVALID_PARAMETER_MESSAGE.to_owned(),
            data: data.into(),
        }
    }

    /// Builds a [`ProxyError::ContractFailed`].
    #[must_use]
    pub fn contract_failed(message: impl Into<String>) -> Self {
        Self::ContractFailed {
            message: message.into(),
        }
    }

    /// Builds a [`ProxyError::ProxyProviderMissingOrInvalid`].
    #[must_use]
    pub fn provider_missing_or_invalid(message: impl Into<String>) -> Self {
        Self::ProxyProviderMissingOrInvalid {
            message: message.into(),
        }
    }

    /// Builds a [`ProxyError::SchemaNotRegistered`].
    #[must_use]
    pub fn schema_not_registered(method: impl Into<String>) -> Self {
        Self::SchemaNotRegistered {
            method: method.into(),
        }
    }

    /// Builds a [`ProxyError::Timeout`].
    #[must_use]
    pub fn timeout(work_order_id: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            work_order_id: work_order_id.into(),
            timeout_secs,
        }
    }

    /// Builds a [`ProxyError::Unsupported`].
    #[must_use]
    pub fn unsupported(method: impl Into<String>) -> Self {
        Self::Unsupported {
            method: method.into(),
        }
    }

    /// Builds a [`ProxyError::UnknownError`].
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::UnknownError {
            message: message.into(),
        }
    }

    /// Status code reported to the caller.
    #[must_use]
    pub const fn status(&self) -> WorkOrderStatus {
        match self {
            Self::InvalidParameterFormatOrValue { .. } => {
                WorkOrderStatus::InvalidParameterFormatOrValue
            }
            Self::ContractFailed { .. }
            | Self::ProxyProviderMissingOrInvalid { .. }
            | Self::Unsupported { .. } => WorkOrderStatus::Failed,
            Self::Timeout { .. } => WorkOrderStatus::Pending,
            Self::SchemaNotRegistered { .. } | Self::UnknownError { .. } => {
                WorkOrderStatus::UnknownError
            }
        }
    }

    /// Renders the error as a JSON-RPC error reply.
    ///
    /// A parameter failure that recorded its own request id answers with
    /// that id; every other error answers with `id`.
    #[must_use]
    pub fn to_envelope(&self, id: RequestId) -> ErrorEnvelope {
        let status = self.status();
        match self {
            Self::InvalidParameterFormatOrValue {
                request_id,
                message,
                data,
            } => ErrorEnvelope::new(
                request_id.clone().unwrap_or(id),
                status,
                message.as_str(),
                data.as_str(),
            ),
            Self::ContractFailed { message } => {
                ErrorEnvelope::new(id, status, "Contract failed", message.as_str())
            }
            Self::ProxyProviderMissingOrInvalid { message } => ErrorEnvelope::new(
                id,
                status,
                "Proxy provider is missing or invalid",
                message.as_str(),
            ),
            Self::SchemaNotRegistered { method } => ErrorEnvelope::new(
                id,
                status,
                "Unknown error",
                format!("No schema registered for method {method}"),
            ),
            Self::Timeout {
                work_order_id,
                timeout_secs,
            } => ErrorEnvelope::new(
                id,
                status,
                RESULT_UNAVAILABLE_MESSAGE,
                serde_json::json!({
                    "workOrderId": work_order_id,
                    "timeoutSecs": timeout_secs,
                    "reason": "the identifier may be invalid or the work order is incomplete",
                }),
            ),
            Self::Unsupported { method } => {
                ErrorEnvelope::new(id, status, UNSUPPORTED_MESSAGE, method.as_str())
            }
            Self::UnknownError { message } => {
                ErrorEnvelope::new(id, status, "Unknown error", Value::from(message.as_str()))
            }
        }
    }
}
