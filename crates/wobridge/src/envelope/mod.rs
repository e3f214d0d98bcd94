//! JSON-RPC response envelopes.
//!
//! Every reply leaves the bridge as one of two fixed shapes:
//!
//! ```json
//! {"jsonrpc":"2.0","id":7,"result":{"workOrderId":"…","code":0}}
//! {"jsonrpc":"2.0","id":7,"error":{"code":2,"message":"…","data":"…"}}
//! ```
//!
//! Field order is part of the contract with existing clients, so both
//! envelopes are plain structs serialised in declaration order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::WorkOrderStatus;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Caller-supplied JSON-RPC correlation id.
///
/// JSON-RPC permits numbers, strings, and `null`; the id is echoed back
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Value);

impl RequestId {
    /// The `null` id used when the request could not be parsed.
    #[must_use]
    pub const fn null() -> Self {
        Self(Value::Null)
    }

    /// Raw JSON value of the id.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(Value::from(value))
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(Value::from(value))
    }
}

impl From<Value> for RequestId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The `error` member of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    code: WorkOrderStatus,
    message: String,
    data: Value,
}

impl ErrorObject {
    /// Status code of the failure.
    #[must_use]
    pub const fn code(&self) -> WorkOrderStatus {
        self.code
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Implementation-specific diagnostic.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }
}

/// JSON-RPC error response.
///
/// Envelopes are built once through [`ErrorEnvelope::new`] and expose no
/// mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    jsonrpc: String,
    id: RequestId,
    error: ErrorObject,
}

impl ErrorEnvelope {
    /// Builds an error envelope.
    #[must_use]
    pub fn new(
        id: RequestId,
        code: WorkOrderStatus,
        message: impl Into<String>,
        data: impl Into<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            error: ErrorObject {
                code,
                message: message.into(),
                data: data.into(),
            },
        }
    }

    /// Correlation id echoed from the request.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// The error member.
    #[must_use]
    pub const fn error(&self) -> &ErrorObject {
        &self.error
    }
}

/// JSON-RPC success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    jsonrpc: String,
    id: RequestId,
    result: Value,
}

impl ResultEnvelope {
    /// Builds a success envelope.
    #[must_use]
    pub fn new(id: RequestId, result: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: result.into(),
        }
    }

    /// Correlation id echoed from the request.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// The result member.
    #[must_use]
    pub const fn result(&self) -> &Value {
        &self.result
    }
}
