//! ivilib-test-harness: Test utilities and mock instruments for ivilib.
//!
//! This crate provides [`MockTransport`] for deterministic byte-level
//! testing of framing code, and [`MockInstrument`] for command-level
//! testing of drivers, both without real hardware.

pub mod mock_instrument;
pub mod mock_transport;

pub use mock_instrument::{Call, MockInstrument};
pub use mock_transport::MockTransport;
