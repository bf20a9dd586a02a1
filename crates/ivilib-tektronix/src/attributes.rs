//! DPO7000 horizontal acquisition attributes.
//!
//! All of these are instrument-wide. The sample rate is not read from the
//! device: it is derived from the record length and the timebase scale,
//! and any write to one of the three stales the others.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use ivilib_core::{
    AttributeFuture, AttributeRegistry, AttributeSpec, AttributeValue, Constraint, IndexDomain,
    Limit, Result, Session, ValueTranslator, format_scientific,
};

/// `acquisition.horizontal_mode`, symbol.
pub const HORIZONTAL_MODE: &str = "acquisition.horizontal_mode";
/// `acquisition.horizontal_roll`, symbol.
pub const HORIZONTAL_ROLL: &str = "acquisition.horizontal_roll";
/// `timebase.scale`, seconds per division.
pub const TIMEBASE_SCALE: &str = "timebase.scale";
/// `acquisition.record_length`, points.
pub const RECORD_LENGTH: &str = "acquisition.record_length";
/// `acquisition.sample_rate`, samples per second.
pub const SAMPLE_RATE: &str = "acquisition.sample_rate";

/// Horizontal divisions on the graticule.
pub const HORIZONTAL_DIVISIONS: f64 = 10.0;

/// How the scope trades record length against sample rate when the
/// timebase changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalMode {
    /// Keep record length constant.
    Auto,
    /// Keep sample rate constant.
    Constant,
    /// Record length and sample rate are set directly; scale is read only.
    Manual,
}

impl HorizontalMode {
    /// Neutral symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            HorizontalMode::Auto => "auto",
            HorizontalMode::Constant => "constant",
            HorizontalMode::Manual => "manual",
        }
    }
}

impl fmt::Display for HorizontalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for HorizontalMode {
    type Err = ivilib_core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(HorizontalMode::Auto),
            "constant" => Ok(HorizontalMode::Constant),
            "manual" => Ok(HorizontalMode::Manual),
            other => Err(ivilib_core::Error::UnsupportedValue {
                attribute: HORIZONTAL_MODE.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Roll mode for slow timebases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalRoll {
    /// Roll when the timebase is slow enough.
    Auto,
    /// Never roll.
    Off,
    /// Roll, timebase permitting.
    On,
}

impl HorizontalRoll {
    /// Neutral symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            HorizontalRoll::Auto => "auto",
            HorizontalRoll::Off => "off",
            HorizontalRoll::On => "on",
        }
    }
}

impl fmt::Display for HorizontalRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for HorizontalRoll {
    type Err = ivilib_core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(HorizontalRoll::Auto),
            "off" => Ok(HorizontalRoll::Off),
            "on" => Ok(HorizontalRoll::On),
            other => Err(ivilib_core::Error::UnsupportedValue {
                attribute: HORIZONTAL_ROLL.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

fn horizontal_mode_translator() -> Result<ValueTranslator> {
    ValueTranslator::new(
        HORIZONTAL_MODE,
        &[("auto", "AUTO"), ("constant", "CONSTANT"), ("manual", "MANUAL")],
    )?
    .with_alias("CONS", "constant")?
    .with_alias("MAN", "manual")
}

fn horizontal_roll_translator() -> Result<ValueTranslator> {
    ValueTranslator::new(HORIZONTAL_ROLL, &[("auto", "AUTO"), ("off", "OFF"), ("on", "ON")])
}

fn positive() -> Constraint {
    Constraint::Range {
        min: Limit::exclusive(0.0),
        max: Limit::inclusive(f64::MAX),
    }
}

/// The DPO7000 horizontal attribute table.
pub fn horizontal_attributes() -> Result<Vec<AttributeSpec>> {
    Ok(vec![
        AttributeSpec::new(HORIZONTAL_MODE, HorizontalMode::Auto.symbol())
            .translated(horizontal_mode_translator()?)
            .scpi(":horizontal:mode?", ":horizontal:mode {value}"),
        AttributeSpec::new(HORIZONTAL_ROLL, HorizontalRoll::Auto.symbol())
            .translated(horizontal_roll_translator()?)
            .scpi(":horizontal:roll?", ":horizontal:roll {value}"),
        AttributeSpec::new(TIMEBASE_SCALE, 1e-3)
            .constraint(positive())
            .scpi(":horizontal:mode:scale?", ":horizontal:mode:scale {value}")
            .coupled(stale_sample_rate),
        AttributeSpec::new(RECORD_LENGTH, 5000i64)
            .constraint(Constraint::Range {
                min: Limit::inclusive(1.0),
                max: Limit::inclusive(f64::MAX),
            })
            .scpi(
                ":horizontal:mode:recordlength?",
                ":horizontal:mode:recordlength {value}",
            )
            .coupled(stale_sample_rate),
        AttributeSpec::new(SAMPLE_RATE, 5000.0 / (1e-3 * HORIZONTAL_DIVISIONS))
            .constraint(positive())
            .custom(read_sample_rate, write_sample_rate)
            .coupled(stale_timebase),
    ])
}

/// Registry for a series: the channel domain always, the horizontal
/// attributes only when the series has them.
pub fn registry(channels: IndexDomain, horizontal: bool) -> Result<AttributeRegistry> {
    let specs = if horizontal {
        horizontal_attributes()?
    } else {
        Vec::new()
    };
    AttributeRegistry::new(vec![channels], specs)
}

/// Record length over the time one record spans.
fn read_sample_rate(session: &mut Session, slot: usize) -> AttributeFuture<'_, AttributeValue> {
    Box::pin(async move {
        let points = session.get(RECORD_LENGTH, slot).await?.as_i64()? as f64;
        let scale = session.get(TIMEBASE_SCALE, slot).await?.as_f64()?;
        Ok(AttributeValue::Float(points / (scale * HORIZONTAL_DIVISIONS)))
    })
}

fn write_sample_rate(
    session: &mut Session,
    _slot: usize,
    value: AttributeValue,
) -> AttributeFuture<'_, ()> {
    Box::pin(async move {
        let rate = value.as_f64()?;
        session
            .write(&format!(":horizontal:mode:samplerate {}", format_scientific(rate)))
            .await
    })
}

fn stale_sample_rate(
    session: &mut Session,
    slot: usize,
    _value: AttributeValue,
) -> AttributeFuture<'_, ()> {
    Box::pin(async move { session.invalidate(SAMPLE_RATE, slot) })
}

/// The scope re-derives scale or record length from a new sample rate,
/// depending on the horizontal mode.
fn stale_timebase(
    session: &mut Session,
    slot: usize,
    _value: AttributeValue,
) -> AttributeFuture<'_, ()> {
    Box::pin(async move {
        debug!("sample rate written, timebase cache dropped");
        session.invalidate(TIMEBASE_SCALE, slot)?;
        session.invalidate(RECORD_LENGTH, slot)
    })
}
