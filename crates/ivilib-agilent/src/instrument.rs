//! [`AgilentInstrument`]: an Infiniium MSO with its logic analyzer.

use async_trait::async_trait;
use tracing::debug;

use ivilib_core::scope::{channel_domain, parse_comma_preamble};
use ivilib_core::{
    AttributeRegistry, CHANNELS, DigitalTrace, DigitalWaveformFetch, Index, Instrument,
    InstrumentClass, InstrumentInfo, InstrumentIo, Manufacturer, Result, Session,
};

use crate::models::AgilentModel;

/// An Agilent Infiniium oscilloscope.
#[derive(Debug)]
pub struct AgilentInstrument {
    instrument: Instrument,
    model: AgilentModel,
}

impl AgilentInstrument {
    pub(crate) fn new(io: Box<dyn InstrumentIo>, model: AgilentModel, simulate: bool) -> Result<Self> {
        let channels = channel_domain(model.analog_channels, model.digital_channels)?;
        let registry = AttributeRegistry::new(vec![channels], Vec::new())?;
        let info = InstrumentInfo {
            manufacturer: Manufacturer::Agilent,
            model_name: model.name.to_string(),
            class: InstrumentClass::Oscilloscope,
        };
        Ok(AgilentInstrument {
            instrument: Instrument::new(info, Session::new(io, registry, simulate)),
            model,
        })
    }

    /// The attribute session backing this scope.
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// The model definition this driver was built for.
    pub fn model(&self) -> &AgilentModel {
        &self.model
    }
}

/// Split an ASCII `:WAVeform:DATA?` reply into trimmed sample strings.
/// A trailing separator does not produce an extra sample.
fn split_ascii_samples(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    let reply = reply.strip_suffix(',').unwrap_or(reply);
    if reply.is_empty() {
        return Vec::new();
    }
    reply.split(',').map(|s| s.trim().to_string()).collect()
}

#[async_trait]
impl DigitalWaveformFetch for AgilentInstrument {
    type Sample = String;

    /// Samples are returned as the device formats them (ASCII, MSB first).
    async fn fetch_waveform_digital(&self, source: Index) -> Result<DigitalTrace<String>> {
        let mut session = self.instrument.lock().await;
        let slot = session.domain(CHANNELS)?.resolve(&source)?;
        if session.simulate() {
            return Ok(DigitalTrace::empty());
        }
        let name = session.domain(CHANNELS)?.name(slot).to_string();

        session.write(":waveform:byteorder msbfirst").await?;
        session.write(":waveform:format ascii").await?;
        session.write(&format!(":waveform:source {name}")).await?;
        let preamble = parse_comma_preamble(&session.query(":waveform:preamble?").await?)?;
        let samples = split_ascii_samples(&session.query(":WAVeform:DATA?").await?);
        debug!(source = %name, samples = samples.len(), "digital waveform fetched");
        Ok(DigitalTrace::new(preamble, samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mso9064a;
    use ivilib_core::Error;
    use ivilib_test_harness::MockInstrument;

    fn scope(mock: &MockInstrument, simulate: bool) -> AgilentInstrument {
        AgilentInstrument::new(mock.boxed(), mso9064a(), simulate).unwrap()
    }

    fn script_fetch(mock: &MockInstrument, source: &str, data: &str) {
        mock.expect_write(":waveform:byteorder msbfirst")
            .expect_write(":waveform:format ascii")
            .expect_write(&format!(":waveform:source {source}"))
            .expect_query(":waveform:preamble?", "4,0,3,1,2.0e-09,1.0e-08,0,0,0,0")
            .expect_query(":WAVeform:DATA?", data);
    }

    #[tokio::test]
    async fn ascii_fetch_sequence() {
        let mock = MockInstrument::new();
        script_fetch(&mock, "d5", "0x01, 0x00 ,0xFF");
        let trace = scope(&mock, false)
            .fetch_waveform_digital("d5".into())
            .await
            .unwrap();

        let points: Vec<(f64, &String)> = trace.iter().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].1, "0x01");
        assert_eq!(points[1].1, "0x00");
        assert!((points[2].0 - 1.4e-8).abs() < 1e-18);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn analog_source_by_ordinal() {
        let mock = MockInstrument::new();
        script_fetch(&mock, "channel2", "1,0,");
        let trace = scope(&mock, false)
            .fetch_waveform_digital(1usize.into())
            .await
            .unwrap();
        assert_eq!(trace.samples(), ["1", "0"]);
    }

    #[tokio::test]
    async fn empty_data_reply_is_empty_trace() {
        let mock = MockInstrument::new();
        script_fetch(&mock, "d0", "\n");
        let trace = scope(&mock, false)
            .fetch_waveform_digital("d0".into())
            .await
            .unwrap();
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn simulated_fetch_is_silent() {
        let mock = MockInstrument::new();
        let trace = scope(&mock, true)
            .fetch_waveform_digital("d15".into())
            .await
            .unwrap();
        assert!(trace.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn short_preamble_is_protocol_error() {
        let mock = MockInstrument::new();
        mock.expect_write(":waveform:byteorder msbfirst")
            .expect_write(":waveform:format ascii")
            .expect_write(":waveform:source d1")
            .expect_query(":waveform:preamble?", "4,0,3");
        let result = scope(&mock, false).fetch_waveform_digital("d1".into()).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn unknown_source_before_io() {
        let mock = MockInstrument::new();
        let result = scope(&mock, false).fetch_waveform_digital("d16".into()).await;
        assert!(matches!(result, Err(Error::IndexResolution { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn ascii_split_edges() {
        assert!(split_ascii_samples("").is_empty());
        assert_eq!(split_ascii_samples(" 7 "), vec!["7"]);
        assert_eq!(split_ascii_samples("a,,b"), vec!["a", "", "b"]);
    }
}
