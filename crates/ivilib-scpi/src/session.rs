//! [`ScpiSession`]: command-level I/O over any byte [`Transport`].
//!
//! One session owns its transport exclusively. Each call sends one
//! newline-terminated command and, for queries, reads exactly one reply
//! line or one IEEE-488.2 block. Unframed replies (file reads) are
//! collected until a receive times out. Bytes left over from an earlier
//! exchange are discarded before the next command goes out.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use ivilib_core::error::{Error, Result};
use ivilib_core::io::InstrumentIo;
use ivilib_core::transport::Transport;

use crate::protocol::{self, BlockResult, LineResult};

/// Default time to wait for each chunk of a reply.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on a reply line before the buffer is considered corrupt.
const MAX_LINE: usize = 64 * 1024;

/// Upper bound on a binary block payload.
const MAX_BLOCK: usize = 256 * 1024 * 1024;

const CHUNK: usize = 4096;

/// SCPI command/query session over a byte transport.
pub struct ScpiSession {
    transport: Box<dyn Transport>,
    rx: BytesMut,
    timeout: Duration,
}

impl std::fmt::Debug for ScpiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScpiSession")
            .field("connected", &self.transport.is_connected())
            .field("buffered", &self.rx.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ScpiSession {
    /// Wrap a connected transport with the default timeout.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        ScpiSession {
            transport,
            rx: BytesMut::with_capacity(CHUNK),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Set the per-chunk receive timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The per-chunk receive timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the underlying transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.rx.clear();
        self.transport.close().await
    }

    async fn send(&mut self, command: &str) -> Result<()> {
        if !self.rx.is_empty() {
            debug!(stale = self.rx.len(), "discarding unread reply bytes");
            self.rx.clear();
        }
        debug!(command, "scpi send");
        self.transport.send(&protocol::encode_command(command)).await
    }

    async fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; CHUNK];
        let n = self.transport.receive(&mut chunk, self.timeout).await?;
        if n == 0 {
            return Err(Error::ConnectionLost);
        }
        trace!(bytes = n, "scpi receive");
        self.rx.extend_from_slice(&chunk[..n]);
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        loop {
            if let LineResult::Line { text, consumed } = protocol::decode_line(&self.rx) {
                self.rx.advance(consumed);
                trace!(reply = %text, "scpi reply");
                return Ok(text);
            }
            if self.rx.len() > MAX_LINE {
                warn!(len = self.rx.len(), "reply line overflow, clearing buffer");
                self.rx.clear();
                return Err(Error::Protocol("reply line too long".into()));
            }
            self.fill().await?;
        }
    }

    async fn read_block(&mut self) -> Result<Vec<u8>> {
        loop {
            match protocol::decode_block(&self.rx) {
                BlockResult::Block { payload, consumed } => {
                    self.rx.advance(consumed);
                    debug!(bytes = payload.len(), "scpi block");
                    return Ok(payload);
                }
                BlockResult::Invalid(msg) => {
                    self.rx.clear();
                    return Err(Error::Protocol(msg));
                }
                BlockResult::Incomplete => {
                    if self.rx.len() > MAX_BLOCK {
                        self.rx.clear();
                        return Err(Error::Protocol("binary block too large".into()));
                    }
                    self.fill().await?;
                }
            }
        }
    }

    /// Everything the instrument sends until it goes quiet. The first
    /// receive must produce data; a later timeout ends the reply.
    async fn read_raw(&mut self) -> Result<Vec<u8>> {
        self.fill().await?;
        loop {
            if self.rx.len() > MAX_BLOCK {
                self.rx.clear();
                return Err(Error::Protocol("raw reply too large".into()));
            }
            match self.fill().await {
                Ok(()) => {}
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        let payload = self.rx.split().to_vec();
        debug!(bytes = payload.len(), "scpi raw reply");
        Ok(payload)
    }
}

#[async_trait]
impl InstrumentIo for ScpiSession {
    async fn write(&mut self, command: &str) -> Result<()> {
        self.send(command).await
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        self.send(command).await?;
        self.read_line().await
    }

    async fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>> {
        self.send(command).await?;
        self.read_block().await
    }

    async fn query_raw(&mut self, command: &str) -> Result<Vec<u8>> {
        self.send(command).await?;
        self.read_raw().await
    }
}
