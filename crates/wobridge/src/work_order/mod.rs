//! Work order requests, results, and the identifier that correlates them.

use std::fmt;

use serde_json::Value;

use crate::envelope::RequestId;
use crate::error::ProxyError;
use crate::status::WorkOrderStatus;

/// Hex identifier of a work order, normalised to lower case.
///
/// This is the sole correlation key between a submission, a direct read, and
/// a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkOrderId(String);

impl WorkOrderId {
    /// Wraps `value`, normalising ASCII hex digits to lower case.
    ///
    /// The value is not checked here; callers run
    /// [`ArgumentValidator::require_hex_of_length`](crate::ArgumentValidator::require_hex_of_length)
    /// first.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().to_ascii_lowercase())
    }

    /// Builds the identifier carried by a binary field.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Lower-case hex text of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when `bytes` hex-encode to this identifier.
    #[must_use]
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        Self::from_bytes(bytes) == *self
    }

    /// Decodes the identifier into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the identifier is not even-length hex.
    pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.0)
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated `WorkOrderSubmit` request.
///
/// Built once from the JSON-RPC `params` object and never mutated; the
/// original object travels to the backend verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderRequest {
    work_order_id: String,
    worker_id: String,
    requester_id: String,
    payload: Value,
    request_id: RequestId,
}

impl WorkOrderRequest {
    /// Extracts the identifiers from a `WorkOrderSubmit` parameter object.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when an
    /// identifier field is absent or not a string.
    pub fn from_params(params: &Value, request_id: RequestId) -> Result<Self, ProxyError> {
        let field = |name: &str| -> Result<String, ProxyError> {
            params
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ProxyError::invalid_parameter(
                        Some(request_id.clone()),
                        format!("Missing parameter {name}"),
                    )
                })
        };

        Ok(Self {
            work_order_id: field("workOrderId")?,
            worker_id: field("workerId")?,
            requester_id: field("requesterId")?,
            payload: params.clone(),
            request_id,
        })
    }

    /// Identifier as supplied by the caller.
    #[must_use]
    pub fn raw_work_order_id(&self) -> &str {
        &self.work_order_id
    }

    /// Normalised correlation key.
    #[must_use]
    pub fn work_order_id(&self) -> WorkOrderId {
        WorkOrderId::new(&self.work_order_id)
    }

    /// Worker identifier as supplied by the caller.
    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Requester identifier as supplied by the caller.
    #[must_use]
    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }

    /// The method-specific parameter object.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// JSON-RPC correlation id of the originating call.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

/// A work order result obtained from the backend.
///
/// Results are either fully decoded or not produced at all; the identifier
/// always equals the one the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderResult {
    work_order_id: WorkOrderId,
    status: WorkOrderStatus,
    payload: Value,
}

impl WorkOrderResult {
    /// Decodes a raw response payload recorded for `work_order_id`.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `raw` is not a JSON document.
    pub fn decode(work_order_id: WorkOrderId, raw: &str) -> Result<Self, serde_json::Error> {
        let payload: Value = serde_json::from_str(raw)?;
        Ok(Self::from_payload(work_order_id, payload))
    }

    /// Wraps an already decoded payload.
    ///
    /// Payloads carrying an `error` object take the status named by its
    /// `code`, or [`WorkOrderStatus::UnknownError`] when the code is not a
    /// status. Everything else is a success.
    #[must_use]
    pub fn from_payload(work_order_id: WorkOrderId, payload: Value) -> Self {
        let status = payload.get("error").map_or(WorkOrderStatus::Success, |error| {
            error
                .get("code")
                .and_then(Value::as_i64)
                .and_then(|code| WorkOrderStatus::try_from(code).ok())
                .unwrap_or(WorkOrderStatus::UnknownError)
        });
        Self {
            work_order_id,
            status,
            payload,
        }
    }

    /// Identifier of the work order.
    #[must_use]
    pub const fn work_order_id(&self) -> &WorkOrderId {
        &self.work_order_id
    }

    /// Status derived from the payload.
    #[must_use]
    pub const fn status(&self) -> WorkOrderStatus {
        self.status
    }

    /// Decoded response payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the result, yielding the payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.payload
    }
}
