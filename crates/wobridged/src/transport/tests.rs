//! Unit tests for the TCP listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use super::*;

/// Echoes one line back and counts connections.
#[derive(Debug, Default)]
struct EchoHandler {
    connections: AtomicUsize,
}

impl ConnectionHandler for EchoHandler {
    fn handle(self: Arc<Self>, stream: TcpStream) -> HandlerFuture {
        Box::pin(async move {
            self.connections.fetch_add(1, Ordering::SeqCst);
            let (read_half, mut writer) = stream.into_split();
            let mut line = String::new();
            let mut reader = BufReader::new(read_half);
            if reader.read_line(&mut line).await.is_ok() {
                let _written = writer.write_all(line.as_bytes()).await;
            }
        })
    }
}

#[rstest]
#[tokio::test]
async fn serves_connections_until_shutdown() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.expect("bind");
    let address = transport.local_addr();
    let handler = Arc::new(EchoHandler::default());
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(transport.serve(Arc::clone(&handler), async move {
        let _signal = stopped.await;
    }));

    for attempt in ["first\n", "second\n"] {
        let mut client = TcpStream::connect(address).await.expect("connect");
        client.write_all(attempt.as_bytes()).await.expect("write");
        let mut reply = String::new();
        BufReader::new(client)
            .read_line(&mut reply)
            .await
            .expect("read");
        assert_eq!(reply, attempt);
    }

    stop.send(()).expect("signal shutdown");
    server.await.expect("listener task");
    assert_eq!(handler.connections.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn reports_bind_failures_with_the_address() {
    let error = TcpTransport::bind("not-an-address")
        .await
        .expect_err("unresolvable address");
    assert!(matches!(error, ListenerError::Bind { ref address, .. } if address == "not-an-address"));
}

#[rstest]
#[tokio::test]
async fn refuses_an_address_already_in_use() {
    let first = TcpTransport::bind("127.0.0.1:0").await.expect("bind");
    let taken = first.local_addr().to_string();
    let error = TcpTransport::bind(&taken).await.expect_err("port in use");
    assert!(error.to_string().contains(&taken));
}
