//! Reply serialisation for the dispatch loop.

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use wobridge::{ErrorEnvelope, ResultEnvelope};

use super::errors::DispatchError;

/// One reply line: a result or an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Successful call.
    Result(ResultEnvelope),
    /// Failed call.
    Error(ErrorEnvelope),
}

impl Reply {
    /// Returns `true` for error replies.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<ResultEnvelope> for Reply {
    fn from(envelope: ResultEnvelope) -> Self {
        Self::Result(envelope)
    }
}

impl From<ErrorEnvelope> for Reply {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self::Error(envelope)
    }
}

/// Writer that frames replies as JSON lines.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Creates a new response writer wrapping the given output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `reply` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_reply(&mut self, reply: &Reply) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(reply).map_err(DispatchError::SerializeResponse)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Unwraps the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
