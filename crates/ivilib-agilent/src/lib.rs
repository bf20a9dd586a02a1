//! Agilent (Keysight) Infiniium backend for ivilib.
//!
//! Covers the MSO9064A mixed-signal scope: model data in [`models`],
//! the logic analyzer fetch in [`instrument`], and the connection
//! [`builder`]. Digital samples are read in ASCII form and returned as
//! the device formats them.

pub mod builder;
pub mod instrument;
pub mod models;

pub use builder::AgilentBuilder;
pub use instrument::AgilentInstrument;
pub use models::AgilentModel;
