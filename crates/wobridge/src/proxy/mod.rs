//! Work order proxy facade.
//!
//! [`WorkOrderProxy`] checks the backend profile once at construction and
//! then routes each protocol operation to the submission executor or the
//! result correlator. Encryption-key management is part of the protocol
//! but no backend implements it; those operations always answer with
//! [`ProxyError::Unsupported`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::info;
use wobridge_config::BackendProfile;

use crate::backend::LedgerBackend;
use crate::correlator::ResultCorrelator;
use crate::envelope::RequestId;
use crate::error::ProxyError;
use crate::status::WorkOrderStatus;
use crate::submission::SubmissionExecutor;
use crate::validation::ArgumentValidator;
use crate::work_order::{WorkOrderRequest, WorkOrderResult};

const PROXY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::proxy");

/// JSON-RPC methods of the work order protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum Method {
    /// Submit a new work order.
    WorkOrderSubmit,
    /// Fetch the result of a work order.
    WorkOrderGetResult,
    /// Record the response of a finished work order.
    WorkOrderComplete,
    /// Read a worker's encryption key.
    EncryptionKeyGet,
    /// Replace a worker's encryption key.
    EncryptionKeySet,
    /// Begin an encryption key rotation.
    EncryptionKeyStart,
    /// Retrieve a rotated encryption key.
    EncryptionKeyRetrieve,
}

impl Method {
    /// Every method in the protocol.
    pub const ALL: [Self; 7] = [
        Self::WorkOrderSubmit,
        Self::WorkOrderGetResult,
        Self::WorkOrderComplete,
        Self::EncryptionKeyGet,
        Self::EncryptionKeySet,
        Self::EncryptionKeyStart,
        Self::EncryptionKeyRetrieve,
    ];

    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for the encryption-key management methods.
    #[must_use]
    pub const fn is_encryption_key(self) -> bool {
        matches!(
            self,
            Self::EncryptionKeyGet
                | Self::EncryptionKeySet
                | Self::EncryptionKeyStart
                | Self::EncryptionKeyRetrieve
        )
    }
}

/// Protocol operations over a single ledger backend.
#[derive(Debug)]
pub struct WorkOrderProxy<B: ?Sized> {
    submission: SubmissionExecutor<B>,
    correlator: ResultCorrelator<B>,
    registry_address: String,
}

impl<B: ?Sized> Clone for WorkOrderProxy<B> {
    fn clone(&self) -> Self {
        Self {
            submission: self.submission.clone(),
            correlator: self.correlator.clone(),
            registry_address: self.registry_address.clone(),
        }
    }
}

impl<B> WorkOrderProxy<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Builds a proxy over `backend` configured by `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::ContractFailed`] when the backend or the
    /// registry address is absent, and
    /// [`ProxyError::ProxyProviderMissingOrInvalid`] when either provider
    /// endpoint is absent or not a URL with a scheme and a host.
    pub fn new(profile: &BackendProfile, backend: Option<Arc<B>>) -> Result<Self, ProxyError> {
        ArgumentValidator::require_non_null([("ledger_backend", backend.as_deref())])?;
        ArgumentValidator::require_non_null([(
            "registry_address",
            profile.registry_address.as_deref(),
        )])?;
        ArgumentValidator::require_valid_endpoint([
            ("ledger_provider", profile.ledger_provider.as_deref()),
            ("event_provider", profile.event_provider.as_deref()),
        ])?;
        let backend = backend
            .ok_or_else(|| ProxyError::contract_failed("ledger backend is not available"))?;
        let registry_address = profile.registry_address.clone().unwrap_or_default();

        let hex_len = profile.identifier_hex_len();
        info!(
            target: PROXY_TARGET,
            registry_address = %registry_address,
            identifier_hex_len = hex_len,
            result_timeout_secs = profile.result_timeout.as_secs(),
            "work order proxy ready"
        );
        Ok(Self {
            submission: SubmissionExecutor::new(Arc::clone(&backend), hex_len),
            correlator: ResultCorrelator::new(backend, hex_len, profile.result_timeout),
            registry_address,
        })
    }

    /// Address of the work order registry.
    #[must_use]
    pub fn registry_address(&self) -> &str {
        &self.registry_address
    }

    /// Default wait applied by [`Self::get_result`].
    #[must_use]
    pub const fn result_timeout(&self) -> Duration {
        self.correlator.timeout()
    }

    /// Submits a work order.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when an
    /// identifier is not hex of the configured width.
    pub fn submit(&self, request: &WorkOrderRequest) -> Result<WorkOrderStatus, ProxyError> {
        self.submission.submit(request)
    }

    /// Records the response of a finished work order.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] when
    /// `work_order_id` is not hex of the configured width.
    pub fn complete(
        &self,
        work_order_id: &str,
        response: &Value,
        request_id: &RequestId,
    ) -> Result<WorkOrderStatus, ProxyError> {
        self.submission.complete(work_order_id, response, request_id)
    }

    /// Fetches the result of a work order, waiting at most the profile's
    /// result timeout.
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
        self.correlator.get_result(work_order_id, request_id).await
    }

    /// Fetches the result of a work order, waiting at most `timeout`.
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
        self.correlator
            .get_result_within(work_order_id, request_id, timeout)
            .await
    }

    /// Reads a worker's encryption key.
    ///
    /// # Errors
    ///
    /// Always returns [`ProxyError::Unsupported`].
    pub fn encryption_key_get(&self, params: &Value) -> Result<Value, ProxyError> {
        self.unsupported(Method::EncryptionKeyGet, params)
    }

    /// Replaces a worker's encryption key.
    ///
    /// # Errors
    ///
    /// Always returns [`ProxyError::Unsupported`].
    pub fn encryption_key_set(&self, params: &Value) -> Result<Value, ProxyError> {
        self.unsupported(Method::EncryptionKeySet, params)
    }

    /// Begins an encryption key rotation.
    ///
    /// # Errors
    ///
    /// Always returns [`ProxyError::Unsupported`].
    pub fn encryption_key_start(&self, params: &Value) -> Result<Value, ProxyError> {
        self.unsupported(Method::EncryptionKeyStart, params)
    }

    /// Retrieves a rotated encryption key.
    ///
    /// # Errors
    ///
    /// Always returns [`ProxyError::Unsupported`].
    pub fn encryption_key_retrieve(&self, params: &Value) -> Result<Value, ProxyError> {
        self.unsupported(Method::EncryptionKeyRetrieve, params)
    }

    fn unsupported(&self, method: Method, params: &Value) -> Result<Value, ProxyError> {
        let worker_id = params
            .get("workerId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        info!(
            target: PROXY_TARGET,
            method = method.as_str(),
            registry_address = %self.registry_address,
            worker_id,
            "operation not supported by backend"
        );
        Err(ProxyError::unsupported(method.as_str()))
    }
}
