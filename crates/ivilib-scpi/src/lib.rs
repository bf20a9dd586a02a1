//! ivilib-scpi: SCPI framing over byte transports.
//!
//! LAN and USB instruments all speak newline-terminated ASCII commands and
//! return bulk data as IEEE-488.2 binary blocks. This crate turns any
//! [`Transport`](ivilib_core::Transport) into an
//! [`InstrumentIo`](ivilib_core::InstrumentIo) the attribute layer can use.
//!
//! # Architecture
//!
//! - [`protocol`] — line and block encode/decode on byte buffers
//! - [`session`] — [`ScpiSession`], the exchange loop over a transport

pub mod protocol;
pub mod session;

pub use session::{DEFAULT_COMMAND_TIMEOUT, ScpiSession};
