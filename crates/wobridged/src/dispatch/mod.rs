//! Line-delimited JSON-RPC dispatch for the work order protocol.
//!
//! Clients keep a connection open and send one JSON-RPC request per line:
//!
//! ```json
//! {"jsonrpc":"2.0","id":1,"method":"WorkOrderGetResult","params":{"workOrderId":"5a5a..."}}
//! ```
//!
//! Each request receives exactly one reply line, either a result envelope or
//! an error envelope:
//!
//! ```json
//! {"jsonrpc":"2.0","id":1,"error":{"code":1,"message":"Work order result is not available","data":{"workOrderId":"5a5a...","timeoutSecs":20,"reason":"timed out waiting for completion"}}}
//! ```
//!
//! Parameters are validated against the method's schema before the request
//! is routed to the [`WorkOrderProxy`](wobridge::WorkOrderProxy).

mod errors;
mod handler;
mod request;
mod response;
mod router;
#[cfg(test)]
mod tests;

pub use self::errors::DispatchError;
pub use self::handler::{DispatchConnectionHandler, MAX_REQUEST_BYTES};
pub use self::request::RpcRequest;
pub use self::response::{Reply, ResponseWriter};
pub use self::router::MethodRouter;
