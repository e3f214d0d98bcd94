//! Shared doubles and fixtures for unit tests.

use std::io;
use std::sync::{Arc, Mutex};

use mockall::mock;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::backend::{
    BackendError, EventFilter, EventKind, LedgerBackend, LedgerOperation, Receipt, Subscription,
    SubscriptionId,
};
use crate::work_order::WorkOrderId;

/// A 32-byte identifier in lower-case hex.
pub(crate) const ORDER_ID: &str =
    "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";

/// A 32-byte identifier in upper-case hex.
pub(crate) const WORKER_ID: &str =
    "C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3";

/// A 32-byte identifier in mixed-case hex.
pub(crate) const REQUESTER_ID: &str =
    "0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F";

/// Hex width of the default identifier.
pub(crate) const HEX_LEN: usize = 64;

mock! {
    pub Ledger {}
    impl LedgerBackend for Ledger {
        fn submit(&self, operation: &LedgerOperation) -> Result<Receipt, BackendError>;
        fn read(&self, work_order_id: &WorkOrderId) -> Result<Option<String>, BackendError>;
        fn subscribe(
            &self,
            kind: EventKind,
            filter: EventFilter,
        ) -> Result<Subscription, BackendError>;
        fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BackendError>;
    }
}

/// In-memory sink for formatted log records.
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Routes this thread's tracing output into the buffer until the guard
    /// is dropped.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured lines emitted at `level` under `target`.
    pub(crate) fn records(&self, level: &str, target: &str) -> Vec<String> {
        let bytes = self.buffer.lock().expect("log buffer").clone();
        let prefix = format!("{target}:");
        String::from_utf8(bytes)
            .expect("utf-8 log output")
            .lines()
            .filter(|line| {
                let mut words = line.split_whitespace();
                words.next() == Some(level) && words.next() == Some(prefix.as_str())
            })
            .map(str::to_owned)
            .collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Writer handed out per record by [`CapturedLogs`].
pub(crate) struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("log buffer")
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
