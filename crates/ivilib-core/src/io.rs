//! Command-level instrument I/O.
//!
//! [`InstrumentIo`] is the interface the attribute layer consumes: send a
//! command string, send a query and read back the textual reply, or send a
//! query and read back a length-prefixed binary block, or send a query
//! and take whatever unframed bytes follow (file transfers). It sits one level
//! above [`Transport`](crate::transport::Transport), which only moves bytes.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Synchronous-in-sequence command/query channel to one instrument.
///
/// Every method performs exactly one exchange. No retries happen at this
/// layer; a failure is returned to the caller unchanged.
#[async_trait]
pub trait InstrumentIo: Send + Sync {
    /// Send a command that produces no reply.
    async fn write(&mut self, command: &str) -> Result<()>;

    /// Send a query and return its textual reply without the terminator.
    async fn query(&mut self, command: &str) -> Result<String>;

    /// Send a query whose reply is an IEEE-488.2 binary block and return
    /// the block payload.
    async fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>>;

    /// Send a query whose reply has no framing and return every byte
    /// received until the instrument goes quiet.
    async fn query_raw(&mut self, command: &str) -> Result<Vec<u8>>;
}

/// Placeholder I/O installed when an instrument is built in simulate mode.
///
/// Simulated sessions never reach their I/O, so every call here fails with
/// [`Error::NotConnected`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedIo;

#[async_trait]
impl InstrumentIo for DisconnectedIo {
    async fn write(&mut self, _command: &str) -> Result<()> {
        Err(Error::NotConnected)
    }

    async fn query(&mut self, _command: &str) -> Result<String> {
        Err(Error::NotConnected)
    }

    async fn query_binary_block(&mut self, _command: &str) -> Result<Vec<u8>> {
        Err(Error::NotConnected)
    }

    async fn query_raw(&mut self, _command: &str) -> Result<Vec<u8>> {
        Err(Error::NotConnected)
    }
}
