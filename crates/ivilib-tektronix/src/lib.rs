//! Tektronix DPO backend for ivilib.
//!
//! - **Model definitions** ([`models`]) -- DPO7000 and DPO3000 series.
//! - **Horizontal attributes** ([`attributes`]) -- DPO7000 horizontal mode,
//!   roll, timebase scale, record length and derived sample rate.
//! - **Curve decoding** ([`curve`]) -- `:wfmoutpre?` parsing and binary
//!   `:curve?` decoding for every point format the scopes emit.
//! - **Screen capture** ([`display`]) -- DPO7000 hardcopy through the
//!   scope's file system.
//! - **Instrument driver** ([`instrument`]) -- analog waveform fetch, the
//!   typed horizontal accessors and screenshots.
//! - **Builder** ([`builder`]) -- fluent construction over LAN, serial, or
//!   simulate mode.

pub mod attributes;
pub mod builder;
pub mod curve;
pub mod display;
pub mod instrument;
pub mod models;

pub use attributes::{HorizontalMode, HorizontalRoll};
pub use builder::TektronixBuilder;
pub use instrument::TektronixInstrument;
pub use models::{TektronixModel, TektronixSeries};
