//! Accept loop for the daemon's TCP listener.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{LISTENER_TARGET, ListenerError};

const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Future driving a single connection to completion.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handles accepted connections. Implementations should avoid panicking.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serves `stream` until the peer disconnects.
    fn handle(self: Arc<Self>, stream: TcpStream) -> HandlerFuture;
}

/// Listener bound to a TCP address.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Binds `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] when the address does not resolve or
    /// is in use.
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: address.to_owned(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddress { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Connections already handed to `handler` keep running after the
    /// listener stops.
    pub async fn serve<H, F>(self, handler: Arc<H>, shutdown: F)
    where
        H: ConnectionHandler + ?Sized,
        F: Future<Output = ()> + Send,
    {
        info!(
            target: LISTENER_TARGET,
            address = %self.local_addr,
            "socket listener active"
        );
        tokio::pin!(shutdown);
        let mut last_error = None::<io::ErrorKind>;
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        last_error = None;
                        debug!(target: LISTENER_TARGET, peer = %peer, "connection accepted");
                        tokio::spawn(Arc::clone(&handler).handle(stream));
                    }
                    Err(error) => {
                        let kind = error.kind();
                        if last_error != Some(kind) {
                            warn!(
                                target: LISTENER_TARGET,
                                error = %error,
                                "socket accept error"
                            );
                        }
                        last_error = Some(kind);
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                },
            }
        }
        info!(
            target: LISTENER_TARGET,
            address = %self.local_addr,
            "socket listener stopped"
        );
    }
}
