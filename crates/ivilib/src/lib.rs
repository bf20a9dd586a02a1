//! # ivilib -- Interchangeable Virtual Instrument drivers
//!
//! `ivilib` is an asynchronous Rust library for driving bench instruments
//! over SCPI: oscilloscopes and the function generators built into some of
//! them. Every driver exposes its settings as a table of named attributes
//! with per-channel caching, and implements capability traits so that
//! application code stays manufacturer-agnostic.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ivilib::{FunctionGenerator, StandardWaveform, StandardWaveformSettings};
//! use ivilib::rigol::{RigolBuilder, models::mso5072};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scope = RigolBuilder::new(mso5072())
//!         .host("192.168.1.50")
//!         .build()
//!         .await?;
//!
//!     scope
//!         .configure_standard_waveform(
//!             "output1".into(),
//!             StandardWaveformSettings {
//!                 waveform: StandardWaveform::Square,
//!                 frequency: Some(10e3),
//!                 amplitude: 2.0,
//!                 dc_offset: 0.0,
//!                 start_phase: Some(0.0),
//!             },
//!         )
//!         .await?;
//!     scope.set_output_enabled("output1".into(), true).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                 | Purpose                                         |
//! |-----------------------|-------------------------------------------------|
//! | `ivilib-core`         | Attribute registry, sessions, capability traits, errors |
//! | `ivilib-scpi`         | SCPI line framing and IEEE-488.2 binary blocks  |
//! | `ivilib-transport`    | TCP and serial transports                       |
//! | `ivilib-rigol`        | Rigol scopes with the WG generator option       |
//! | `ivilib-agilent`      | Agilent Infiniium MSO logic capture             |
//! | `ivilib-tektronix`    | Tektronix DPO analog capture and timebase       |
//! | **`ivilib`**          | This facade crate -- re-exports everything      |
//!
//! ## Feature Flags
//!
//! | Feature     | Enables                        | Default |
//! |-------------|--------------------------------|---------|
//! | `rigol`     | [`rigol`] module               | yes     |
//! | `agilent`   | [`agilent`] module             | yes     |
//! | `tektronix` | [`tektronix`] module           | yes     |
//! | `full`      | All manufacturer backends      | no      |
//!
//! ## Simulate mode
//!
//! Every builder takes `.simulate(true)`. A simulated instrument opens no
//! transport: writes only update the cache, reads return cached values,
//! and waveform fetches return empty traces.

pub use ivilib_core::*;

/// Rigol backend.
///
/// Provides [`RigolInstrument`](rigol::RigolInstrument) and
/// [`RigolBuilder`](rigol::RigolBuilder) for Rigol oscilloscopes with the
/// two-output waveform generator option, including logic capture on MSO
/// models.
#[cfg(feature = "rigol")]
pub mod rigol {
    pub use ivilib_rigol::*;
}

/// Agilent Infiniium backend.
///
/// Provides [`AgilentInstrument`](agilent::AgilentInstrument) and
/// [`AgilentBuilder`](agilent::AgilentBuilder) for ASCII logic captures on
/// the MSO9064A.
#[cfg(feature = "agilent")]
pub mod agilent {
    pub use ivilib_agilent::*;
}

/// Tektronix DPO backend.
///
/// Provides [`TektronixInstrument`](tektronix::TektronixInstrument) and
/// [`TektronixBuilder`](tektronix::TektronixBuilder) for binary analog
/// captures and, on the DPO7000 series, horizontal acquisition control.
#[cfg(feature = "tektronix")]
pub mod tektronix {
    pub use ivilib_tektronix::*;
}

/// Returns a flat list of all supported instrument models across all
/// enabled manufacturer backends.
///
/// # Example
///
/// ```
/// for def in ivilib::supported_instruments() {
///     println!("{} {} ({})", def.manufacturer, def.model_name, def.class);
/// }
/// ```
pub fn supported_instruments() -> Vec<InstrumentDefinition> {
    let mut defs = Vec::new();

    #[cfg(feature = "rigol")]
    {
        defs.extend(
            rigol::models::all_rigol_models()
                .iter()
                .map(InstrumentDefinition::from),
        );
    }

    #[cfg(feature = "agilent")]
    {
        defs.extend(
            agilent::models::all_agilent_models()
                .iter()
                .map(InstrumentDefinition::from),
        );
    }

    #[cfg(feature = "tektronix")]
    {
        defs.extend(
            tektronix::models::all_tektronix_models()
                .iter()
                .map(InstrumentDefinition::from),
        );
    }

    defs
}
