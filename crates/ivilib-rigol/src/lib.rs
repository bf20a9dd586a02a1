//! Rigol backend for ivilib.
//!
//! Drives Rigol oscilloscopes fitted with the two-output waveform
//! generator (WG) option. It provides:
//!
//! - **Model definitions** ([`models`]) -- channel counts, bandwidth and
//!   generator limits for the DS1000Z through MSO8000 ranges.
//! - **Command builders** ([`commands`]) -- waveform and impedance token
//!   tables, the `APPLY` command and its per-family reply layout.
//! - **Attribute table** ([`attributes`]) -- the generator attributes with
//!   their SCPI templates, including the coupled waveform shape.
//! - **Instrument driver** ([`instrument`]) -- [`FunctionGenerator`] and,
//!   on MSO models, [`DigitalWaveformFetch`].
//! - **Builder** ([`builder`]) -- fluent construction over LAN, serial, or
//!   simulate mode.
//!
//! # Ramp shapes
//!
//! The WG option has a single `RAMP` shape whose symmetry setting decides
//! what it looks like. Selecting `ramp_up` or `ramp_down` pins symmetry to
//! 100 or 0; `triangle` moves a one-sided symmetry back to 50. Reading the
//! shape back classifies `RAMP` by the current symmetry.
//!
//! [`FunctionGenerator`]: ivilib_core::FunctionGenerator
//! [`DigitalWaveformFetch`]: ivilib_core::DigitalWaveformFetch

pub mod attributes;
pub mod builder;
pub mod commands;
pub mod instrument;
pub mod models;

pub use builder::RigolBuilder;
pub use instrument::RigolInstrument;
pub use models::RigolModel;
