//! Error types for listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The address could not be bound.
    #[error("failed to bind TCP listener at {address}: {source}")]
    Bind {
        /// Address as configured.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The bound socket did not report its address.
    #[error("failed to read listener address: {source}")]
    LocalAddress {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
}
