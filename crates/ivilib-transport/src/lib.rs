//! Transport implementations for ivilib.
//!
//! Concrete implementations of the [`Transport`](ivilib_core::Transport)
//! trait for the physical links bench instruments use:
//!
//! - [`TcpTransport`]: raw SCPI sockets on LAN instruments
//! - [`SerialTransport`]: RS-232 and USB virtual COM ports
//!
//! Wrap either in an `ivilib_scpi::ScpiSession` to get command-level I/O.

pub mod serial;
pub mod tcp;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
pub use tcp::{DEFAULT_SCPI_PORT, TcpTransport};
