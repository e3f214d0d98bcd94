//! JSON-RPC daemon for the work order bridge.
//!
//! The daemon loads layered configuration through [`wobridge_config`],
//! installs structured telemetry, builds a [`wobridge::WorkOrderProxy`] over
//! a ledger backend, and answers line-delimited JSON-RPC requests on a TCP
//! listener. Each connection is served on its own task and may carry any
//! number of requests.
//!
//! Health reporting hooks emit structured events at each bootstrap stage so
//! operators can tell a configuration fault from a bind failure.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), wobridged::BootstrapError> {
//! wobridged::run_daemon().await
//! # }
//! ```

mod bootstrap;
pub mod dispatch;
mod health;
mod process;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, BoundDaemon, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{run_daemon, run_daemon_with, shutdown_signal};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
