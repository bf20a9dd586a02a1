//! [`RigolInstrument`]: a Rigol oscilloscope driven through its WG option
//! and, on MSO models, its logic analyzer.

use async_trait::async_trait;
use tracing::debug;

use ivilib_core::fgen::attr;
use ivilib_core::scope::{channel_domain, parse_comma_preamble};
use ivilib_core::{
    ArbitraryLimits, AttributeValue, CHANNELS, DigitalTrace, DigitalWaveformFetch, Error,
    FunctionGenerator, Index, Instrument, InstrumentClass, InstrumentInfo, InstrumentIo,
    Manufacturer, OUTPUTS, OutputMode, Result, Session, StandardWaveform,
    StandardWaveformSettings, ValueTranslator,
};

use crate::attributes::{couple_waveform, registry};
use crate::commands::{
    apply_command, apply_query, apply_schema, classify_ramp, parse_apply, waveform_translator,
};
use crate::models::RigolModel;

/// A Rigol oscilloscope with the waveform generator option.
#[derive(Debug)]
pub struct RigolInstrument {
    instrument: Instrument,
    model: RigolModel,
    waveforms: ValueTranslator,
}

impl RigolInstrument {
    /// Assemble the attribute table for `model` and bind it to `io`.
    pub(crate) fn new(io: Box<dyn InstrumentIo>, model: RigolModel, simulate: bool) -> Result<Self> {
        let channels = channel_domain(model.analog_channels, model.digital_channels)?;
        let session = Session::new(io, registry(model.outputs, channels)?, simulate);
        let info = InstrumentInfo {
            manufacturer: Manufacturer::Rigol,
            model_name: model.name.to_string(),
            class: InstrumentClass::Oscilloscope,
        };
        Ok(RigolInstrument {
            instrument: Instrument::new(info, session),
            model,
            waveforms: waveform_translator()?,
        })
    }

    /// The model definition this driver was built for.
    pub fn model(&self) -> &RigolModel {
        &self.model
    }
}

/// Every slot a settings read fills.
fn settings_attributes(with_frequency: bool) -> Vec<&'static str> {
    let mut names = vec![attr::WAVEFORM, attr::AMPLITUDE, attr::DC_OFFSET];
    if with_frequency {
        names.extend([attr::FREQUENCY, attr::START_PHASE]);
    }
    names
}

fn cached_settings(session: &Session, slot: usize) -> Result<StandardWaveformSettings> {
    let waveform = session
        .cached(attr::WAVEFORM, slot)?
        .as_str()?
        .parse::<StandardWaveform>()
        .map_err(|_| Error::Protocol("cached waveform is not a standard shape".into()))?;
    let schema = apply_schema(waveform);
    let float = |name: &str| -> Result<f64> { session.cached(name, slot)?.as_f64() };
    Ok(StandardWaveformSettings {
        waveform,
        frequency: schema
            .has_frequency()
            .then(|| float(attr::FREQUENCY))
            .transpose()?,
        amplitude: float(attr::AMPLITUDE)?,
        dc_offset: float(attr::DC_OFFSET)?,
        start_phase: schema.has_phase().then(|| float(attr::START_PHASE)).transpose()?,
    })
}

fn settings_cached(session: &Session, slot: usize) -> Result<bool> {
    if session.simulate() {
        return Ok(true);
    }
    if !session.is_valid(attr::WAVEFORM, slot)? {
        return Ok(false);
    }
    let waveform = cached_settings(session, slot)?.waveform;
    let schema = apply_schema(waveform);
    for name in settings_attributes(schema.has_frequency()) {
        if !session.is_valid(name, slot)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[async_trait]
impl FunctionGenerator for RigolInstrument {
    fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Bulk `apply?` read. Every field is parsed before any slot is
    /// stored, so a malformed reply leaves the cache untouched.
    async fn read_output_settings(&self, output: Index) -> Result<StandardWaveformSettings> {
        let mut session = self.instrument.lock().await;
        let slot = session.domain(OUTPUTS)?.resolve(&output)?;
        if settings_cached(&session, slot)? {
            return cached_settings(&session, slot);
        }

        let source = session.domain(OUTPUTS)?.header("source", slot).to_string();
        let reply = session.query(&apply_query(&source)).await?;
        let mut settings = parse_apply(&self.waveforms, &reply)?;
        if settings.waveform.is_ramp_family() {
            let symmetry = session.get(attr::SYMMETRY, slot).await?.as_f64()?;
            settings.waveform = classify_ramp(symmetry);
        }

        session.store(attr::WAVEFORM, slot, settings.waveform.symbol())?;
        session.store(attr::AMPLITUDE, slot, settings.amplitude)?;
        session.store(attr::DC_OFFSET, slot, settings.dc_offset)?;
        if let Some(f) = settings.frequency {
            session.store(attr::FREQUENCY, slot, f)?;
        }
        if let Some(p) = settings.start_phase {
            session.store(attr::START_PHASE, slot, p)?;
        }
        session.store(attr::OUTPUT_MODE, slot, OutputMode::Function.symbol())?;
        debug!(%source, ?settings, "output settings read");
        Ok(settings)
    }

    /// Bulk `APPLY` write. Every field is validated against its
    /// attribute's constraint before anything is sent.
    async fn configure_standard_waveform(
        &self,
        output: Index,
        settings: StandardWaveformSettings,
    ) -> Result<()> {
        let mut session = self.instrument.lock().await;
        let slot = session.domain(OUTPUTS)?.resolve(&output)?;
        let schema = apply_schema(settings.waveform);

        let mut updates: Vec<(&'static str, AttributeValue)> = vec![
            (attr::WAVEFORM, settings.waveform.symbol().into()),
            (attr::AMPLITUDE, settings.amplitude.into()),
            (attr::DC_OFFSET, settings.dc_offset.into()),
        ];
        if schema.has_frequency() {
            if let Some(f) = settings.frequency {
                updates.push((attr::FREQUENCY, f.into()));
            }
        }
        if schema.has_phase() {
            if let Some(p) = settings.start_phase {
                updates.push((attr::START_PHASE, p.into()));
            }
        }
        let registry = session.registry();
        let mut validated = Vec::with_capacity(updates.len());
        for (name, value) in updates {
            let spec = registry.spec(registry.find(name)?);
            validated.push((name, spec.validate(value)?));
        }

        let source = session.domain(OUTPUTS)?.header("source", slot).to_string();
        let command = apply_command(&self.waveforms, &source, &settings)?;
        if !session.simulate() {
            session.write(&command).await?;
        }
        let stored: Vec<&'static str> = validated.iter().map(|(name, _)| *name).collect();
        for (name, value) in validated {
            session.store(name, slot, value)?;
        }
        debug!(%source, ?settings, "standard waveform configured");
        if let Err(e) = couple_waveform(&mut session, slot, settings.waveform.symbol().into()).await {
            for name in stored {
                session.invalidate(name, slot)?;
            }
            return Err(e);
        }
        Ok(())
    }

    fn arbitrary_limits(&self) -> Result<ArbitraryLimits> {
        Ok(self.model.arbitrary)
    }
}

#[async_trait]
impl DigitalWaveformFetch for RigolInstrument {
    type Sample = u8;

    /// Samples are the raw logic bytes of the selected source.
    async fn fetch_waveform_digital(&self, source: Index) -> Result<DigitalTrace<u8>> {
        if !self.model.has_digital() {
            return Err(Error::Unsupported(format!(
                "{} has no logic analyzer",
                self.model.name
            )));
        }
        let mut session = self.instrument.lock().await;
        let slot = session.domain(CHANNELS)?.resolve(&source)?;
        if session.simulate() {
            return Ok(DigitalTrace::empty());
        }
        let name = session.domain(CHANNELS)?.name(slot).to_string();

        session.write(&format!(":waveform:source {name}")).await?;
        let preamble = parse_comma_preamble(&session.query(":waveform:preamble?").await?)?;
        let samples = session.query_binary_block(":WAVeform:DATA?").await?;
        debug!(source = %name, samples = samples.len(), "digital waveform fetched");
        Ok(DigitalTrace::new(preamble, samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ds1104z, mso5072};
    use ivilib_test_harness::MockInstrument;

    fn rigol(mock: &MockInstrument, simulate: bool) -> RigolInstrument {
        RigolInstrument::new(mock.boxed(), mso5072(), simulate).unwrap()
    }

    fn settings(waveform: StandardWaveform) -> StandardWaveformSettings {
        StandardWaveformSettings {
            waveform,
            frequency: Some(1000.0),
            amplitude: 2.0,
            dc_offset: 0.0,
            start_phase: Some(0.0),
        }
    }

    #[tokio::test]
    async fn typed_accessors_go_through_table() {
        let mock = MockInstrument::new();
        mock.expect_write(":source1:frequency 2.500000e+03")
            .expect_query(":output2:impedance?", "OMEG");
        let wg = rigol(&mock, false);

        wg.set_frequency("output1".into(), 2500.0).await.unwrap();
        assert_eq!(wg.frequency("output1".into()).await.unwrap(), 2500.0);
        assert_eq!(
            wg.output_impedance("output2".into()).await.unwrap(),
            ivilib_core::OutputImpedance::HighZ
        );
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn settings_read_decomposes_apply_reply() {
        let mock = MockInstrument::new();
        mock.expect_query(
            ":source2:apply?",
            "SQU,2.000000E+03,1.500000E+00,2.500000E-01,9.000000E+01",
        );
        let wg = rigol(&mock, false);

        let s = wg.read_output_settings("output2".into()).await.unwrap();
        assert_eq!(s.waveform, StandardWaveform::Square);
        assert_eq!(s.frequency, Some(2000.0));

        // Every decoded slot is now cached.
        assert_eq!(wg.amplitude("output2".into()).await.unwrap(), 1.5);
        assert_eq!(wg.dc_offset("output2".into()).await.unwrap(), 0.25);
        assert_eq!(wg.start_phase("output2".into()).await.unwrap(), 90.0);
        assert_eq!(wg.waveform("output2".into()).await.unwrap(), StandardWaveform::Square);
        assert_eq!(wg.output_mode("output2".into()).await.unwrap(), OutputMode::Function);
        // A second bulk read is served from cache.
        assert_eq!(wg.read_output_settings("output2".into()).await.unwrap(), s);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn settings_read_noise_leaves_frequency_alone() {
        let mock = MockInstrument::new();
        mock.expect_query(":source1:apply?", "NOIS,DEF,3.000000E-01,0.000000E+00,DEF");
        let wg = rigol(&mock, false);

        let s = wg.read_output_settings(0usize.into()).await.unwrap();
        assert_eq!(s.waveform, StandardWaveform::Noise);
        assert_eq!(s.frequency, None);
        let session = wg.instrument().lock().await;
        assert!(!session.is_valid(attr::FREQUENCY, 0usize).unwrap());
        assert!(session.is_valid(attr::AMPLITUDE, 0usize).unwrap());
    }

    #[tokio::test]
    async fn settings_read_classifies_ramp() {
        let mock = MockInstrument::new();
        mock.expect_query(":source1:apply?", "RAMP,1.0E+03,1.0E+00,0.0E+00,0.0E+00")
            .expect_query(":source1:function:ramp:symmetry?", "0.0");
        let wg = rigol(&mock, false);
        let s = wg.read_output_settings(0usize.into()).await.unwrap();
        assert_eq!(s.waveform, StandardWaveform::RampDown);
    }

    #[tokio::test]
    async fn malformed_apply_reply_stores_nothing() {
        let mock = MockInstrument::new();
        mock.expect_query(":source1:apply?", "SIN,1.0E+03,oops,0.0,0.0");
        let wg = rigol(&mock, false);
        assert!(matches!(
            wg.read_output_settings(0usize.into()).await,
            Err(Error::Protocol(_))
        ));
        let session = wg.instrument().lock().await;
        assert!(!session.is_valid(attr::WAVEFORM, 0usize).unwrap());
        assert!(!session.is_valid(attr::FREQUENCY, 0usize).unwrap());
    }

    #[tokio::test]
    async fn simulated_settings_come_from_defaults() {
        let mock = MockInstrument::new();
        let wg = rigol(&mock, true);
        let s = wg.read_output_settings(1usize.into()).await.unwrap();
        let mut expected = settings(StandardWaveform::Sine);
        expected.amplitude = 1.0;
        assert_eq!(s, expected);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn configure_sends_apply_and_caches() {
        let mock = MockInstrument::new();
        mock.expect_write(
            ":source1:APPLY:SIN 1.000000e+03, 2.000000e+00, 0.000000e+00, 0.000000e+00",
        );
        let wg = rigol(&mock, false);

        wg.configure_standard_waveform("output1".into(), settings(StandardWaveform::Sine))
            .await
            .unwrap();
        assert_eq!(wg.amplitude("output1".into()).await.unwrap(), 2.0);
        assert_eq!(wg.frequency("output1".into()).await.unwrap(), 1000.0);
        assert_eq!(wg.output_mode("output1".into()).await.unwrap(), OutputMode::Function);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn configure_noise_uses_short_form() {
        let mock = MockInstrument::new();
        mock.expect_write(":source2:APPLY:NOISE 5.000000e-01, 1.000000e-01");
        let wg = rigol(&mock, false);
        let noise = StandardWaveformSettings {
            waveform: StandardWaveform::Noise,
            frequency: None,
            amplitude: 0.5,
            dc_offset: 0.1,
            start_phase: None,
        };
        wg.configure_standard_waveform(1usize.into(), noise).await.unwrap();
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn configure_ramp_down_couples_symmetry() {
        let mock = MockInstrument::new();
        mock.expect_write(
            ":source1:APPLY:RAMP 1.000000e+03, 2.000000e+00, 0.000000e+00, 0.000000e+00",
        )
        .expect_write(":source1:function:ramp:symmetry 0.000000e+00");
        let wg = rigol(&mock, false);
        wg.configure_standard_waveform(0usize.into(), settings(StandardWaveform::RampDown))
            .await
            .unwrap();
        assert_eq!(
            wg.waveform(0usize.into()).await.unwrap(),
            StandardWaveform::RampDown
        );
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn configure_failed_symmetry_write_leaves_slots_stale() {
        let mock = MockInstrument::new();
        mock.expect_write(
            ":source1:APPLY:RAMP 1.000000e+03, 2.000000e+00, 0.000000e+00, 0.000000e+00",
        )
        .fail_write(":source1:function:ramp:symmetry 1.000000e+02", Error::ConnectionLost);
        let wg = rigol(&mock, false);
        assert!(matches!(
            wg.configure_standard_waveform(0usize.into(), settings(StandardWaveform::RampUp))
                .await,
            Err(Error::ConnectionLost)
        ));
        let session = wg.instrument().lock().await;
        for name in [attr::WAVEFORM, attr::AMPLITUDE, attr::DC_OFFSET, attr::FREQUENCY] {
            assert!(!session.is_valid(name, 0usize).unwrap(), "{name} still valid");
        }
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn configure_validates_every_field_first() {
        let mock = MockInstrument::new();
        let wg = rigol(&mock, false);
        let mut bad = settings(StandardWaveform::Sine);
        bad.frequency = Some(6e7);
        assert!(matches!(
            wg.configure_standard_waveform(0usize.into(), bad).await,
            Err(Error::OutOfRange { .. })
        ));
        let mut bad = settings(StandardWaveform::Sine);
        bad.amplitude = 0.005;
        assert!(wg.configure_standard_waveform(0usize.into(), bad).await.is_err());
        assert_eq!(mock.call_count(), 0);
        let session = wg.instrument().lock().await;
        assert!(!session.is_valid(attr::WAVEFORM, 0usize).unwrap());
    }

    #[test]
    fn arbitrary_limits_from_model() {
        let mock = MockInstrument::new();
        let wg = rigol(&mock, true);
        let limits = wg.arbitrary_limits().unwrap();
        assert_eq!(limits.size_max, 131_072);
        assert!(wg.validate_arbitrary_waveform(&[0.0, 1.0, -1.0]).is_ok());
        assert!(wg.validate_arbitrary_waveform(&[0.5]).is_err());
        assert!(wg.validate_arbitrary_waveform(&[0.0, 1.01]).is_err());
    }

    #[tokio::test]
    async fn stored_waveforms_unsupported() {
        let mock = MockInstrument::new();
        let wg = rigol(&mock, true);
        assert!(matches!(
            wg.create_arbitrary_waveform(&[0.0, 0.5]).await,
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn digital_fetch_sequence() {
        let mock = MockInstrument::new();
        mock.expect_write(":waveform:source d3")
            .expect_query(":waveform:preamble?", "0,0,4,1,1.000000e-06,-2.0e-06,1,1,0,0")
            .expect_block(":WAVeform:DATA?", &[0x01, 0x00, 0xff, 0x08]);
        let wg = rigol(&mock, false);

        let trace = wg.fetch_waveform_digital("D3".into()).await.unwrap();
        let points: Vec<(f64, u8)> = trace.iter().map(|(t, s)| (t, *s)).collect();
        assert_eq!(points.len(), 4);
        assert!((points[0].0 - (-3.0e-6)).abs() < 1e-15);
        assert!((points[3].0 - 0.0).abs() < 1e-15);
        assert_eq!(points[2].1, 0xff);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn simulated_digital_fetch_is_empty_and_silent() {
        let mock = MockInstrument::new();
        let wg = rigol(&mock, true);
        let trace = wg.fetch_waveform_digital("d0".into()).await.unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.iter().count(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn digital_fetch_needs_logic_analyzer() {
        let mock = MockInstrument::new();
        let wg = RigolInstrument::new(mock.boxed(), ds1104z(), false).unwrap();
        assert!(matches!(
            wg.fetch_waveform_digital("d0".into()).await,
            Err(Error::Unsupported(_))
        ));
        let wg = rigol(&mock, false);
        assert!(matches!(
            wg.fetch_waveform_digital("d16".into()).await,
            Err(Error::IndexResolution { .. })
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn identify_and_reset() {
        let mock = MockInstrument::new();
        mock.expect_query("*IDN?", "RIGOL TECHNOLOGIES,MSO5072,MS5A2,00.01.02")
            .expect_write("*RST");
        let wg = rigol(&mock, false);
        let id = wg.instrument().identify().await.unwrap();
        assert_eq!(id.model, "MSO5072");
        wg.instrument().reset().await.unwrap();
    }
}
