//! TCP listener for JSON-RPC clients.
//!
//! The transport binds the configured address and hands every accepted
//! connection to a [`ConnectionHandler`] on its own task.

mod errors;
mod listener;
#[cfg(test)]
mod tests;

pub use self::errors::ListenerError;
pub use self::listener::{ConnectionHandler, HandlerFuture, TcpTransport};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
