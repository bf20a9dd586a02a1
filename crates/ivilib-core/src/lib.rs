//! ivilib-core: Core traits, attribute registry and error definitions for
//! ivilib.
//!
//! This crate defines the manufacturer-agnostic abstractions every ivilib
//! backend builds on. Applications depend on these types without pulling
//! in any specific instrument driver.
//!
//! # Key types
//!
//! - [`Instrument`] / [`Session`] -- attribute access with per-index caching
//! - [`AttributeSpec`] / [`AttributeRegistry`] -- a driver's static attribute table
//! - [`ValueTranslator`] -- neutral symbol <-> device token mapping
//! - [`InstrumentIo`] -- command-level I/O (write, query, binary block)
//! - [`Transport`] -- byte-level communication channel
//! - [`FunctionGenerator`], [`DigitalWaveformFetch`], [`AnalogWaveformFetch`] -- capabilities
//! - [`Error`] / [`Result`] -- error handling

pub mod attribute;
pub mod error;
pub mod fgen;
pub mod helpers;
pub mod index;
pub mod io;
pub mod registry;
pub mod scope;
pub mod session;
pub mod trace;
pub mod translate;
pub mod transport;
pub mod types;
pub mod value;

// Re-export key types at crate root for ergonomic `use ivilib_core::*`.
pub use attribute::{Access, AttributeFuture, AttributeSpec, ReadFn, SCALAR_DOMAIN, WriteFn};
pub use error::{Error, Result};
pub use fgen::{ArbitraryLimits, FunctionGenerator, OUTPUTS, StandardWaveformSettings};
pub use helpers::{format_scientific, parse_scpi_bool, parse_scpi_float, parse_scpi_int};
pub use index::{Index, IndexDomain};
pub use io::{DisconnectedIo, InstrumentIo};
pub use registry::AttributeRegistry;
pub use scope::{AnalogWaveformFetch, CHANNELS, DigitalWaveformFetch};
pub use session::{Instrument, Session};
pub use trace::{AnalogTrace, DigitalTrace, VerticalScale, WaveformPreamble};
pub use translate::ValueTranslator;
pub use transport::Transport;
pub use types::*;
pub use value::{AttributeValue, Constraint, Limit, ValueKind};
