//! Process entry point: bootstrap, serve, and stop on a termination signal.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use wobridge::{InMemoryLedger, LedgerBackend};

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Runs the daemon with layered configuration over an in-memory ledger
/// until SIGINT or SIGTERM arrives.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first stage that failed.
pub async fn run_daemon() -> Result<(), BootstrapError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(InMemoryLedger::new()),
        shutdown_signal(),
    )
    .await
}

/// Runs the daemon with the supplied collaborators until `shutdown`
/// resolves.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first stage that failed.
pub async fn run_daemon_with<B, F>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    backend: Arc<B>,
    shutdown: F,
) -> Result<(), BootstrapError>
where
    B: LedgerBackend + ?Sized + 'static,
    F: Future<Output = ()> + Send,
{
    let daemon = bootstrap_with(loader, reporter, backend)?;
    let bound = daemon.bind().await?;
    bound.serve(shutdown).await;
    Ok(())
}

/// Resolves once the process receives SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = wait_for_interrupt() => {}
                    _ = terminate.recv() => {
                        info!(
                            target: PROCESS_TARGET,
                            signal = "SIGTERM",
                            "shutdown signal received"
                        );
                    }
                }
                return;
            }
            Err(error) => {
                warn!(
                    target: PROCESS_TARGET,
                    error = %error,
                    "failed to install SIGTERM handler"
                );
            }
        }
    }
    wait_for_interrupt().await;
}

async fn wait_for_interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(
            target: PROCESS_TARGET,
            signal = "SIGINT",
            "shutdown signal received"
        ),
        Err(error) => {
            warn!(
                target: PROCESS_TARGET,
                error = %error,
                "failed to install SIGINT handler; running until killed"
            );
            std::future::pending::<()>().await;
        }
    }
}
