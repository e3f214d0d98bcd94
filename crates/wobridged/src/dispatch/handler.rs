//! Connection handler that dispatches JSON-RPC lines.
//!
//! A connection stays open for any number of requests. Each line is parsed,
//! routed, and answered before the next one is read, so replies arrive in
//! request order.

use std::sync::Arc;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader,
};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use wobridge::{LedgerBackend, RequestValidator, WorkOrderProxy};

use crate::transport::{ConnectionHandler, HandlerFuture};

use super::errors::DispatchError;
use super::request::RpcRequest;
use super::response::{Reply, ResponseWriter};
use super::router::{DISPATCH_TARGET, MethodRouter};

/// Maximum size of a single request line in bytes, newline included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Connection handler that parses and dispatches JSON-RPC requests.
#[derive(Debug)]
pub struct DispatchConnectionHandler<B: ?Sized> {
    router: MethodRouter<B>,
}

impl<B> DispatchConnectionHandler<B>
where
    B: LedgerBackend + ?Sized,
{
    /// Creates a handler answering requests with `proxy`.
    #[must_use]
    pub const fn new(proxy: WorkOrderProxy<B>, validator: RequestValidator) -> Self {
        Self {
            router: MethodRouter::new(proxy, validator),
        }
    }

    /// Answers a single request line.
    pub async fn dispatch_line(&self, line: &[u8]) -> Reply {
        let request = match RpcRequest::parse(line).and_then(|request| {
            request.validate()?;
            Ok(request)
        }) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                return error.to_envelope().into();
            }
        };

        debug!(
            target: DISPATCH_TARGET,
            method = request.method(),
            "dispatching request"
        );
        self.router.route(&request).await
    }

    /// Serves requests from `stream` until the peer disconnects or a read
    /// fails.
    pub async fn serve_connection<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let mut writer = ResponseWriter::new(write_half);

        loop {
            let line = match read_request_line(&mut reader).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(target: DISPATCH_TARGET, "client disconnected");
                    return;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                    let reply = Reply::from(error.to_envelope());
                    if let Err(write_error) = writer.write_reply(&reply).await {
                        warn!(
                            target: DISPATCH_TARGET,
                            error = %write_error,
                            "failed to write reply"
                        );
                    }
                    return;
                }
            };

            if line.trim_ascii().is_empty() {
                continue;
            }

            let reply = self.dispatch_line(&line).await;
            if let Err(error) = writer.write_reply(&reply).await {
                warn!(target: DISPATCH_TARGET, %error, "failed to write reply");
                return;
            }
        }
    }
}

impl<B> ConnectionHandler for DispatchConnectionHandler<B>
where
    B: LedgerBackend + ?Sized + 'static,
{
    fn handle(self: Arc<Self>, stream: TcpStream) -> HandlerFuture {
        Box::pin(async move { self.serve_connection(stream).await })
    }
}

/// Reads one bounded request line.
///
/// Returns `Ok(None)` once the peer has closed the stream. A final line
/// without a trailing newline is still returned.
async fn read_request_line<R>(reader: &mut R) -> Result<Option<Vec<u8>>, DispatchError>
where
    R: AsyncBufRead + Unpin,
{
    let limit = u64::try_from(MAX_REQUEST_BYTES)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut line = Vec::new();
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut line)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if line.len() > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(line.len(), MAX_REQUEST_BYTES));
    }
    Ok(Some(line))
}
