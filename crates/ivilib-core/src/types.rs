//! Core types used throughout ivilib.
//!
//! Manufacturer-agnostic descriptions of instruments and the neutral
//! vocabularies shared by every driver.

use std::fmt;
use std::str::FromStr;

/// Instrument manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    /// Rigol (DS/MSO scopes with the WG option).
    Rigol,
    /// Agilent / Keysight Infiniium.
    Agilent,
    /// Tektronix DPO series.
    Tektronix,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Manufacturer::Rigol => "Rigol",
            Manufacturer::Agilent => "Agilent",
            Manufacturer::Tektronix => "Tektronix",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`Manufacturer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseManufacturerError(String);

impl fmt::Display for ParseManufacturerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown manufacturer: '{}'. Expected: rigol, agilent, tektronix",
            self.0
        )
    }
}

impl std::error::Error for ParseManufacturerError {}

impl FromStr for Manufacturer {
    type Err = ParseManufacturerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rigol" => Ok(Manufacturer::Rigol),
            "agilent" | "keysight" => Ok(Manufacturer::Agilent),
            "tektronix" | "tek" => Ok(Manufacturer::Tektronix),
            _ => Err(ParseManufacturerError(s.to_string())),
        }
    }
}

/// Broad instrument class, used for catalog filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentClass {
    /// Oscilloscope (possibly with digital channels or a generator option).
    Oscilloscope,
    /// Stand-alone function / arbitrary waveform generator.
    FunctionGenerator,
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentClass::Oscilloscope => write!(f, "Oscilloscope"),
            InstrumentClass::FunctionGenerator => write!(f, "Function generator"),
        }
    }
}

/// A supported instrument model with enough information for a UI picker.
///
/// Obtained via `ivilib::supported_instruments()` (facade crate) or by
/// converting a manufacturer-specific model type via its `From`
/// implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentDefinition {
    /// The manufacturer.
    pub manufacturer: Manufacturer,
    /// Model name as printed on the front panel (e.g. "MSO5072").
    pub model_name: &'static str,
    /// Instrument class.
    pub class: InstrumentClass,
    /// Number of analog input channels.
    pub analog_channels: usize,
    /// Number of digital (logic) input channels.
    pub digital_channels: usize,
    /// Number of waveform generator outputs.
    pub outputs: usize,
    /// Analog bandwidth in hertz (0 when not applicable).
    pub bandwidth_hz: f64,
}

/// Static information about a connected instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentInfo {
    /// The manufacturer.
    pub manufacturer: Manufacturer,
    /// Model name.
    pub model_name: String,
    /// Instrument class.
    pub class: InstrumentClass,
}

/// Parsed `*IDN?` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Manufacturer string as reported.
    pub manufacturer: String,
    /// Model string as reported.
    pub model: String,
    /// Serial number.
    pub serial_number: String,
    /// Firmware revision.
    pub firmware_revision: String,
}

impl Identity {
    /// Parse the four comma separated `*IDN?` fields. Missing trailing
    /// fields are left empty.
    pub fn parse(reply: &str) -> Self {
        let mut fields = reply.trim().splitn(4, ',').map(|s| s.trim().to_string());
        Identity {
            manufacturer: fields.next().unwrap_or_default(),
            model: fields.next().unwrap_or_default(),
            serial_number: fields.next().unwrap_or_default(),
            firmware_revision: fields.next().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (s/n {}, fw {})",
            self.manufacturer, self.model, self.serial_number, self.firmware_revision
        )
    }
}

/// Error returned when a neutral symbol is not part of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSymbolError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseSymbolError {}

/// Standard waveform shapes in the neutral vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardWaveform {
    /// Sine wave.
    Sine,
    /// Square wave.
    Square,
    /// Symmetric triangle.
    Triangle,
    /// Rising sawtooth.
    RampUp,
    /// Falling sawtooth.
    RampDown,
    /// Pulse train.
    Pulse,
    /// White noise.
    Noise,
    /// Constant level.
    Dc,
    /// sin(x)/x.
    Sinc,
    /// Exponential rise.
    ExpRise,
    /// Exponential fall.
    ExpFall,
    /// Cardiac (ECG) shape.
    Cardiac,
    /// Gaussian pulse.
    Gaussian,
    /// Lorentz pulse.
    Lorentz,
    /// Haversine.
    Haversine,
}

impl StandardWaveform {
    /// Every shape, in declaration order.
    pub const ALL: [StandardWaveform; 15] = [
        StandardWaveform::Sine,
        StandardWaveform::Square,
        StandardWaveform::Triangle,
        StandardWaveform::RampUp,
        StandardWaveform::RampDown,
        StandardWaveform::Pulse,
        StandardWaveform::Noise,
        StandardWaveform::Dc,
        StandardWaveform::Sinc,
        StandardWaveform::ExpRise,
        StandardWaveform::ExpFall,
        StandardWaveform::Cardiac,
        StandardWaveform::Gaussian,
        StandardWaveform::Lorentz,
        StandardWaveform::Haversine,
    ];

    /// Neutral symbol stored in attribute slots.
    pub fn symbol(&self) -> &'static str {
        match self {
            StandardWaveform::Sine => "sine",
            StandardWaveform::Square => "square",
            StandardWaveform::Triangle => "triangle",
            StandardWaveform::RampUp => "ramp_up",
            StandardWaveform::RampDown => "ramp_down",
            StandardWaveform::Pulse => "pulse",
            StandardWaveform::Noise => "noise",
            StandardWaveform::Dc => "dc",
            StandardWaveform::Sinc => "sinc",
            StandardWaveform::ExpRise => "exp_rise",
            StandardWaveform::ExpFall => "exp_fall",
            StandardWaveform::Cardiac => "cardiac",
            StandardWaveform::Gaussian => "gaussian",
            StandardWaveform::Lorentz => "lorentz",
            StandardWaveform::Haversine => "haversine",
        }
    }

    /// Triangle and the two ramps share one device shape, told apart by
    /// symmetry.
    pub fn is_ramp_family(&self) -> bool {
        matches!(
            self,
            StandardWaveform::Triangle | StandardWaveform::RampUp | StandardWaveform::RampDown
        )
    }
}

impl fmt::Display for StandardWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for StandardWaveform {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        StandardWaveform::ALL
            .iter()
            .find(|w| w.symbol().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseSymbolError {
                kind: "waveform",
                value: s.to_string(),
            })
    }
}

/// Output load impedance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputImpedance {
    /// High impedance load.
    HighZ,
    /// 50 ohm load.
    FiftyOhms,
}

impl OutputImpedance {
    /// Neutral symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            OutputImpedance::HighZ => "HighZ",
            OutputImpedance::FiftyOhms => "50Ohms",
        }
    }
}

impl fmt::Display for OutputImpedance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for OutputImpedance {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highz" => Ok(OutputImpedance::HighZ),
            "50ohms" | "50" => Ok(OutputImpedance::FiftyOhms),
            _ => Err(ParseSymbolError {
                kind: "impedance",
                value: s.to_string(),
            }),
        }
    }
}

/// Generator output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Standard waveform.
    Function,
    /// Arbitrary waveform.
    Arbitrary,
}

impl OutputMode {
    /// Neutral symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            OutputMode::Function => "function",
            OutputMode::Arbitrary => "arbitrary",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for OutputMode {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(OutputMode::Function),
            "arbitrary" => Ok(OutputMode::Arbitrary),
            _ => Err(ParseSymbolError {
                kind: "output mode",
                value: s.to_string(),
            }),
        }
    }
}
