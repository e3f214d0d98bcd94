//! Daemon bootstrap orchestration.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use wobridge::{LedgerBackend, ProxyError, RequestValidator, WorkOrderProxy};
use wobridge_config::Config;

use crate::dispatch::DispatchConnectionHandler;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, TcpTransport};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when any source fails to parse.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a pre-resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The backend profile was rejected by the proxy.
    #[error("failed to construct work order proxy: {source}")]
    Proxy {
        /// Underlying proxy error.
        #[source]
        source: ProxyError,
    },
    /// The JSON-RPC listener could not be bound.
    #[error("failed to start listener: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon<B: ?Sized> {
    config: Config,
    proxy: WorkOrderProxy<B>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<B> Daemon<B>
where
    B: LedgerBackend + ?Sized + 'static,
{
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the proxy serving requests.
    #[must_use]
    pub const fn proxy(&self) -> &WorkOrderProxy<B> {
        &self.proxy
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Listener`] when the address cannot be bound.
    pub async fn bind(self) -> Result<BoundDaemon<B>, BootstrapError> {
        match TcpTransport::bind(self.config.listen_address()).await {
            Ok(transport) => {
                self.reporter.listener_ready(transport.local_addr());
                Ok(BoundDaemon {
                    transport,
                    handler: Arc::new(DispatchConnectionHandler::new(
                        self.proxy,
                        RequestValidator::default(),
                    )),
                    reporter: self.reporter,
                })
            }
            Err(source) => {
                let error = BootstrapError::Listener { source };
                self.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }
}

/// A daemon whose listener is bound but not yet accepting.
pub struct BoundDaemon<B: ?Sized> {
    transport: TcpTransport,
    handler: Arc<DispatchConnectionHandler<B>>,
    reporter: Arc<dyn HealthReporter>,
}

impl<B> BoundDaemon<B>
where
    B: LedgerBackend + ?Sized + 'static,
{
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Accepts connections until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        self.transport.serve(self.handler, shutdown).await;
        self.reporter.shutdown_requested();
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] describing the first stage that failed; the
/// reporter has already been told about it.
pub fn bootstrap_with<B>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    backend: Arc<B>,
) -> Result<Daemon<B>, BootstrapError>
where
    B: LedgerBackend + ?Sized + 'static,
{
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let proxy = match WorkOrderProxy::new(&config.backend_profile(), Some(backend)) {
        Ok(proxy) => proxy,
        Err(source) => {
            let error = BootstrapError::Proxy { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        proxy,
        telemetry,
        reporter,
    })
}
