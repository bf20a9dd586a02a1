//! Scripted command-level instrument for driver tests.
//!
//! [`MockInstrument`] implements [`InstrumentIo`] directly, so driver tests
//! script SCPI strings rather than bytes. Clones share one script and one
//! call log: hand a clone to the driver builder and keep the original to
//! assert on what the driver sent.
//!
//! # Example
//!
//! ```
//! use ivilib_test_harness::MockInstrument;
//!
//! let mock = MockInstrument::new();
//! mock.expect_query(":source1:function?", "SIN");
//! mock.expect_write(":source1:frequency 1.000000e+03");
//! let io = mock.boxed(); // give this to the driver
//! # drop(io);
//! assert_eq!(mock.call_count(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use ivilib_core::error::{Error, Result};
use ivilib_core::io::InstrumentIo;

/// One exchange the driver performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `write(command)`.
    Write(String),
    /// `query(command)`.
    Query(String),
    /// `query_binary_block(command)`.
    Block(String),
    /// `query_raw(command)`.
    Raw(String),
}

impl Call {
    /// The command string of this call.
    pub fn command(&self) -> &str {
        match self {
            Call::Write(c) | Call::Query(c) | Call::Block(c) | Call::Raw(c) => c,
        }
    }
}

#[derive(Debug)]
enum Reply {
    None,
    Text(String),
    Bytes(Vec<u8>),
    Fail(Error),
}

#[derive(Debug)]
struct Step {
    call: Call,
    reply: Reply,
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Step>,
    log: Vec<Call>,
}

/// A scripted [`InstrumentIo`] with a shared call log.
#[derive(Debug, Clone, Default)]
pub struct MockInstrument {
    state: Arc<Mutex<State>>,
}

impl MockInstrument {
    /// Create an instrument with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: Call, reply: Reply) -> &Self {
        self.state().script.push_back(Step { call, reply });
        self
    }

    /// Expect `write(command)`.
    pub fn expect_write(&self, command: &str) -> &Self {
        self.push(Call::Write(command.to_string()), Reply::None)
    }

    /// Expect `query(command)` and answer with `reply`.
    pub fn expect_query(&self, command: &str, reply: &str) -> &Self {
        self.push(Call::Query(command.to_string()), Reply::Text(reply.to_string()))
    }

    /// Expect `query_raw(command)` and answer with `payload`.
    pub fn expect_raw(&self, command: &str, payload: &[u8]) -> &Self {
        self.push(Call::Raw(command.to_string()), Reply::Bytes(payload.to_vec()))
    }

    /// Expect `query_binary_block(command)` and answer with `payload`.
    pub fn expect_block(&self, command: &str, payload: &[u8]) -> &Self {
        self.push(Call::Block(command.to_string()), Reply::Bytes(payload.to_vec()))
    }

    /// Expect `write(command)` and fail it with `error`.
    pub fn fail_write(&self, command: &str, error: Error) -> &Self {
        self.push(Call::Write(command.to_string()), Reply::Fail(error))
    }

    /// Expect `query(command)` and fail it with `error`.
    pub fn fail_query(&self, command: &str, error: Error) -> &Self {
        self.push(Call::Query(command.to_string()), Reply::Fail(error))
    }

    /// Every exchange performed so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().log.clone()
    }

    /// Number of exchanges performed so far.
    pub fn call_count(&self) -> usize {
        self.state().log.len()
    }

    /// Command strings performed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state()
            .log
            .iter()
            .map(|c| c.command().to_string())
            .collect()
    }

    /// Scripted exchanges not yet performed.
    pub fn remaining(&self) -> usize {
        self.state().script.len()
    }

    /// A boxed clone sharing this script, for driver builders.
    pub fn boxed(&self) -> Box<dyn InstrumentIo> {
        Box::new(self.clone())
    }

    fn exchange(&self, call: Call) -> Result<Reply> {
        let mut state = self.state();
        state.log.push(call.clone());
        let Some(step) = state.script.pop_front() else {
            return Err(Error::Protocol(format!(
                "unscripted call {call:?}: no more expectations"
            )));
        };
        if step.call != call {
            return Err(Error::Protocol(format!(
                "unexpected call: expected {:?}, got {call:?}",
                step.call
            )));
        }
        match step.reply {
            Reply::Fail(e) => Err(e),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl InstrumentIo for MockInstrument {
    async fn write(&mut self, command: &str) -> Result<()> {
        self.exchange(Call::Write(command.to_string())).map(|_| ())
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        match self.exchange(Call::Query(command.to_string()))? {
            Reply::Text(t) => Ok(t),
            _ => Err(Error::Timeout),
        }
    }

    async fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>> {
        match self.exchange(Call::Block(command.to_string()))? {
            Reply::Bytes(b) => Ok(b),
            _ => Err(Error::Timeout),
        }
    }

    async fn query_raw(&mut self, command: &str) -> Result<Vec<u8>> {
        match self.exchange(Call::Raw(command.to_string()))? {
            Reply::Bytes(b) => Ok(b),
            _ => Err(Error::Timeout),
        }
    }
}
