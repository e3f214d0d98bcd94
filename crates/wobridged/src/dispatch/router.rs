//! Method routing for JSON-RPC dispatch.
//!
//! Each request is matched to a [`Method`], validated against that method's
//! schema, and then handed to the proxy. Every outcome, including failures,
//! becomes a [`Reply`].

use std::str::FromStr;

use serde_json::{Value, json};
use tracing::{debug, warn};

use wobridge::{
    ErrorEnvelope, LedgerBackend, Method, ProxyError, RequestId, RequestValidator, ResultEnvelope,
    WorkOrderProxy, WorkOrderRequest, WorkOrderStatus,
};

use super::request::RpcRequest;
use super::response::Reply;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes validated requests to a [`WorkOrderProxy`].
#[derive(Debug)]
pub struct MethodRouter<B: ?Sized> {
    proxy: WorkOrderProxy<B>,
    validator: RequestValidator,
}

impl<B> MethodRouter<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Builds a router over `proxy` that checks parameters with `validator`.
    #[must_use]
    pub const fn new(proxy: WorkOrderProxy<B>, validator: RequestValidator) -> Self {
        Self { proxy, validator }
    }

    /// Answers `request`.
    pub async fn route(&self, request: &RpcRequest) -> Reply {
        let id = request.id().clone();
        let Ok(method) = Method::from_str(request.method()) else {
            warn!(
                target: DISPATCH_TARGET,
                method = request.method(),
                "unknown method"
            );
            return ProxyError::invalid_parameter(
                None,
                format!("Unknown method: {}", request.method()),
            )
            .to_envelope(id)
            .into();
        };

        if let Err(error) = self
            .validator
            .validate(method.as_str(), request.params(), &id)
        {
            debug!(
                target: DISPATCH_TARGET,
                method = method.as_str(),
                error = %error,
                "request rejected by schema"
            );
            return error.to_envelope(id).into();
        }

        let params = request.params();
        let outcome = match method {
            Method::WorkOrderSubmit => self.submit(params, &id),
            Method::WorkOrderComplete => self.complete(params, &id),
            Method::WorkOrderGetResult => self.get_result(params, &id).await,
            Method::EncryptionKeyGet => {
                self.proxy.encryption_key_get(params).map(|value| success(&id, value))
            }
            Method::EncryptionKeySet => {
                self.proxy.encryption_key_set(params).map(|value| success(&id, value))
            }
            Method::EncryptionKeyStart => {
                self.proxy.encryption_key_start(params).map(|value| success(&id, value))
            }
            Method::EncryptionKeyRetrieve => self
                .proxy
                .encryption_key_retrieve(params)
                .map(|value| success(&id, value)),
        };

        outcome.unwrap_or_else(|error| {
            debug!(
                target: DISPATCH_TARGET,
                method = method.as_str(),
                status = error.status().as_str(),
                error = %error,
                "request failed"
            );
            error.to_envelope(id).into()
        })
    }

    fn submit(&self, params: &Value, id: &RequestId) -> Result<Reply, ProxyError> {
        let request = WorkOrderRequest::from_params(params, id.clone())?;
        let status = self.proxy.submit(&request)?;
        Ok(status_reply(id, request.raw_work_order_id(), status))
    }

    fn complete(&self, params: &Value, id: &RequestId) -> Result<Reply, ProxyError> {
        let work_order_id = string_param(params, "workOrderId", id)?;
        let response = params.get("workOrderResponse").ok_or_else(|| {
            ProxyError::invalid_parameter(
                Some(id.clone()),
                "Missing parameter workOrderResponse",
            )
        })?;
        let status = self.proxy.complete(work_order_id, response, id)?;
        Ok(status_reply(id, work_order_id, status))
    }

    async fn get_result(&self, params: &Value, id: &RequestId) -> Result<Reply, ProxyError> {
        let work_order_id = string_param(params, "workOrderId", id)?;
        self.proxy
            .get_result(work_order_id, id)
            .await?
            .map(|result| success(id, result.into_payload()))
            .ok_or_else(|| {
                ProxyError::timeout(work_order_id, self.proxy.result_timeout().as_secs())
            })
    }
}

fn string_param<'a>(
    params: &'a Value,
    name: &str,
    id: &RequestId,
) -> Result<&'a str, ProxyError> {
    params.get(name).and_then(Value::as_str).ok_or_else(|| {
        ProxyError::invalid_parameter(Some(id.clone()), format!("Missing parameter {name}"))
    })
}

fn success(id: &RequestId, result: Value) -> Reply {
    ResultEnvelope::new(id.clone(), result).into()
}

fn status_reply(id: &RequestId, work_order_id: &str, status: WorkOrderStatus) -> Reply {
    if status == WorkOrderStatus::Success {
        return success(
            id,
            json!({ "workOrderId": work_order_id, "code": status.code() }),
        );
    }
    let message = match status {
        WorkOrderStatus::Failed => "Work order operation failed",
        _ => "Work order operation outcome is unknown",
    };
    ErrorEnvelope::new(id.clone(), status, message, work_order_id).into()
}
