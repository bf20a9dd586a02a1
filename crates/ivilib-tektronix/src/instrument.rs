//! [`TektronixInstrument`]: a DPO series oscilloscope.

use async_trait::async_trait;
use tracing::debug;

use ivilib_core::scope::channel_domain;
use ivilib_core::{
    AnalogTrace, AnalogWaveformFetch, CHANNELS, Error, Index, Instrument, InstrumentClass,
    InstrumentInfo, InstrumentIo, Manufacturer, Result, Session,
};

use crate::attributes::{
    HORIZONTAL_DIVISIONS, HORIZONTAL_MODE, HORIZONTAL_ROLL, HorizontalMode, HorizontalRoll,
    RECORD_LENGTH, SAMPLE_RATE, TIMEBASE_SCALE, registry,
};
use crate::curve::{decode_curve, parse_wfmoutpre};
use crate::display::{self, screenshot_formats};
use crate::models::TektronixModel;

/// A Tektronix DPO oscilloscope.
#[derive(Debug)]
pub struct TektronixInstrument {
    instrument: Instrument,
    model: TektronixModel,
}

impl TektronixInstrument {
    pub(crate) fn new(io: Box<dyn InstrumentIo>, model: TektronixModel, simulate: bool) -> Result<Self> {
        let channels = channel_domain(model.analog_channels, 0)?
            .with_headers("data", (1..=model.analog_channels).map(|i| format!("ch{i}")).collect())?;
        let registry = registry(channels, model.has_horizontal_control())?;
        let info = InstrumentInfo {
            manufacturer: Manufacturer::Tektronix,
            model_name: model.name.to_string(),
            class: InstrumentClass::Oscilloscope,
        };
        Ok(TektronixInstrument {
            instrument: Instrument::new(info, Session::new(io, registry, simulate)),
            model,
        })
    }

    /// The attribute session backing this scope.
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// The model definition this driver was built for.
    pub fn model(&self) -> &TektronixModel {
        &self.model
    }

    fn require_horizontal(&self) -> Result<()> {
        if self.model.has_horizontal_control() {
            Ok(())
        } else {
            Err(Error::Unsupported(format!(
                "{} has no horizontal mode control",
                self.model.name
            )))
        }
    }

    async fn get(&self, name: &str) -> Result<ivilib_core::AttributeValue> {
        self.require_horizontal()?;
        self.instrument.get(name, 0usize).await
    }

    async fn set(&self, name: &str, value: impl Into<ivilib_core::AttributeValue>) -> Result<()> {
        self.require_horizontal()?;
        self.instrument.set(name, 0usize, value).await
    }

    /// Horizontal mode.
    pub async fn horizontal_mode(&self) -> Result<HorizontalMode> {
        self.get(HORIZONTAL_MODE).await?.as_str()?.parse()
    }

    /// Set the horizontal mode.
    pub async fn set_horizontal_mode(&self, mode: HorizontalMode) -> Result<()> {
        self.set(HORIZONTAL_MODE, mode.symbol()).await
    }

    /// Roll mode.
    pub async fn horizontal_roll(&self) -> Result<HorizontalRoll> {
        self.get(HORIZONTAL_ROLL).await?.as_str()?.parse()
    }

    /// Set the roll mode.
    pub async fn set_horizontal_roll(&self, roll: HorizontalRoll) -> Result<()> {
        self.set(HORIZONTAL_ROLL, roll.symbol()).await
    }

    /// Seconds per horizontal division.
    pub async fn timebase_scale(&self) -> Result<f64> {
        self.get(TIMEBASE_SCALE).await?.as_f64()
    }

    /// Set seconds per horizontal division.
    pub async fn set_timebase_scale(&self, seconds: f64) -> Result<()> {
        self.set(TIMEBASE_SCALE, seconds).await
    }

    /// Time spanned by the full screen.
    pub async fn timebase_range(&self) -> Result<f64> {
        Ok(self.timebase_scale().await? * HORIZONTAL_DIVISIONS)
    }

    /// Points per record.
    pub async fn record_length(&self) -> Result<i64> {
        self.get(RECORD_LENGTH).await?.as_i64()
    }

    /// Set points per record.
    pub async fn set_record_length(&self, points: i64) -> Result<()> {
        self.set(RECORD_LENGTH, points).await
    }

    /// Effective sample rate, derived from record length and timebase.
    pub async fn sample_rate(&self) -> Result<f64> {
        self.get(SAMPLE_RATE).await?.as_f64()
    }

    /// Request a sample rate.
    pub async fn set_sample_rate(&self, rate: f64) -> Result<()> {
        self.set(SAMPLE_RATE, rate).await
    }

    /// Capture the screen as an image file in `format` (`"png"`).
    ///
    /// Returns no bytes when simulating. An unknown format fails with
    /// [`Error::UnsupportedValue`] before any I/O.
    pub async fn fetch_screenshot(&self, format: &str) -> Result<Vec<u8>> {
        if !self.model.has_screenshot() {
            return Err(Error::Unsupported(format!(
                "{} has no screen capture",
                self.model.name
            )));
        }
        let formats = screenshot_formats()?;
        let token = formats.to_device(format)?;
        let mut session = self.instrument.lock().await;
        if session.simulate() {
            return Ok(Vec::new());
        }
        let image = display::capture(&mut session, token).await?;
        debug!(format, bytes = image.len(), "screenshot fetched");
        Ok(image)
    }
}

#[async_trait]
impl AnalogWaveformFetch for TektronixInstrument {
    /// Requests the whole record at the fastest binary encoding, then
    /// decodes whatever format the scope reports in `:wfmoutpre?`.
    async fn fetch_waveform(&self, channel: Index) -> Result<AnalogTrace> {
        let mut session = self.instrument.lock().await;
        let slot = session.domain(CHANNELS)?.resolve(&channel)?;
        if session.simulate() {
            return Ok(AnalogTrace::empty());
        }
        let source = session.domain(CHANNELS)?.header("data", slot).to_string();

        session.write(&format!(":data:source {source}")).await?;
        session.write(":data:encdg fastest").await?;
        session.write(":data:width 2").await?;
        session.write(":data:start 1").await?;
        session.write(":data:stop 1e10").await?;
        let layout = parse_wfmoutpre(&session.query(":wfmoutpre?").await?)?;
        let block = session.query_binary_block(":curve?").await?;
        let raw = decode_curve(&layout, &block);
        debug!(%source, format = ?layout.format, points = raw.len(), "analog waveform fetched");
        Ok(AnalogTrace::new(layout.preamble, layout.vertical, raw))
    }
}
