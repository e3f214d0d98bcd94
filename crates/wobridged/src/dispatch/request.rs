//! Request deserialisation for the dispatch loop.

use serde::Deserialize;
use serde_json::Value;

use wobridge::{JSONRPC_VERSION, RequestId};

use super::errors::DispatchError;

/// Parsed JSON-RPC request from a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcRequest {
    /// Protocol version; only `"2.0"` is accepted when present.
    #[serde(default)]
    jsonrpc: Option<String>,
    /// Caller's identifier, echoed in the reply.
    #[serde(default)]
    id: RequestId,
    /// Method name.
    method: String,
    /// Method parameters, passed to schema validation unchanged.
    #[serde(default)]
    params: Value,
}

impl RpcRequest {
    /// Parses a request line.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed
    /// before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedJson`] if the line is empty or not
    /// JSON, and [`DispatchError::InvalidStructure`] if the JSON is not a
    /// request object. The latter keeps whatever `id` the object carried.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }

        let value: Value =
            serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        let id = value
            .get("id")
            .cloned()
            .map_or_else(RequestId::null, RequestId::from);
        serde_json::from_value(value)
            .map_err(|error| DispatchError::invalid_structure(id, error.to_string()))
    }

    /// Checks the protocol version and the method name.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidStructure`] when `jsonrpc` is present
    /// but not `"2.0"`, or when `method` is blank.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if let Some(version) = self.jsonrpc.as_deref()
            && version != JSONRPC_VERSION
        {
            return Err(DispatchError::invalid_structure(
                self.id.clone(),
                format!("unsupported jsonrpc version: {version}"),
            ));
        }
        if self.method.trim().is_empty() {
            return Err(DispatchError::invalid_structure(
                self.id.clone(),
                "method field is empty",
            ));
        }
        Ok(())
    }

    /// Caller's identifier.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Normalised (trimmed) method name.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.trim()
    }

    /// Method parameters.
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }
}
