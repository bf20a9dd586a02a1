//! The Rigol WG attribute table.
//!
//! Built once per driver instance from the model's output count. Plain
//! attributes map onto a single query/command pair; the waveform shape is
//! custom because the device folds triangle and both ramps into one token
//! and because selecting a shape implicitly switches the output to
//! function mode.

use tracing::debug;

use ivilib_core::fgen::attr;
use ivilib_core::{
    AttributeFuture, AttributeRegistry, AttributeSpec, AttributeValue, Constraint, Error,
    IndexDomain, OUTPUTS, OutputMode, Result, Session, StandardWaveform,
};

use crate::commands::{classify_ramp, forced_symmetry, impedance_translator, waveform_token,
    waveform_translator};

/// Output domain `output1..outputN` with `source1..sourceN` headers.
pub fn output_domain(outputs: usize) -> Result<IndexDomain> {
    IndexDomain::new(OUTPUTS, IndexDomain::numbered_names("output", outputs))?
        .with_headers("source", IndexDomain::numbered_names("source", outputs))
}

/// Every neutral waveform symbol the WG option accepts.
fn waveform_symbols() -> Vec<&'static str> {
    StandardWaveform::ALL.iter().map(|w| w.symbol()).collect()
}

/// The generator attribute table.
pub fn generator_attributes() -> Result<Vec<AttributeSpec>> {
    Ok(vec![
        AttributeSpec::new(attr::OUTPUT_ENABLED, false)
            .over(OUTPUTS)
            .scpi(":{output}?", ":{output} {value}"),
        AttributeSpec::new(attr::OUTPUT_IMPEDANCE, "50Ohms")
            .over(OUTPUTS)
            .translated(impedance_translator()?)
            .scpi(":{output}:impedance?", ":{output}:impedance {value}"),
        AttributeSpec::new(attr::OUTPUT_MODE, OutputMode::Function.symbol())
            .over(OUTPUTS)
            .constraint(Constraint::OneOf(vec![
                OutputMode::Function.symbol(),
                OutputMode::Arbitrary.symbol(),
            ])),
        AttributeSpec::new(attr::OUTPUT_OPERATION_MODE, "continuous")
            .over(OUTPUTS)
            .constraint(Constraint::OneOf(vec!["continuous"])),
        AttributeSpec::new(attr::OUTPUT_REFERENCE_CLOCK_SOURCE, "internal")
            .over(OUTPUTS)
            .constraint(Constraint::OneOf(vec!["internal"])),
        AttributeSpec::new(attr::WAVEFORM, StandardWaveform::Sine.symbol())
            .over(OUTPUTS)
            .constraint(Constraint::OneOf(waveform_symbols()))
            .translated(waveform_translator()?)
            .custom(read_waveform, write_waveform)
            .coupled(couple_waveform),
        AttributeSpec::new(attr::FREQUENCY, 1000.0)
            .over(OUTPUTS)
            .range(0.1, 50e6)
            .scpi(":{source}:frequency?", ":{source}:frequency {value}"),
        AttributeSpec::new(attr::START_PHASE, 0.0)
            .over(OUTPUTS)
            .range(-180.0, 180.0)
            .scpi(":{source}:phase?", ":{source}:phase {value}"),
        AttributeSpec::new(attr::SYMMETRY, 50.0)
            .over(OUTPUTS)
            .range(0.0, 100.0)
            .scpi(
                ":{source}:function:ramp:symmetry?",
                ":{source}:function:ramp:symmetry {value}",
            ),
        AttributeSpec::new(attr::AMPLITUDE, 1.0)
            .over(OUTPUTS)
            .range(0.01, 5.0)
            .scpi(":{source}:voltage?", ":{source}:voltage {value}"),
        AttributeSpec::new(attr::DC_OFFSET, 0.0)
            .over(OUTPUTS)
            .scpi(":{source}:voltage:offset?", ":{source}:voltage:offset {value}"),
        AttributeSpec::new(attr::DUTY_CYCLE_HIGH, 50.0)
            .over(OUTPUTS)
            .range(10.0, 90.0)
            .scpi(":{source}:pulse:dcycle?", ":{source}:pulse:dcycle {value}"),
    ])
}

/// Registry for a model with `outputs` generator outputs and the given
/// scope channel domain.
pub fn registry(outputs: usize, channels: IndexDomain) -> Result<AttributeRegistry> {
    AttributeRegistry::new(
        vec![output_domain(outputs)?, channels],
        generator_attributes()?,
    )
}

fn source_header(session: &Session, slot: usize) -> Result<String> {
    Ok(session.domain(OUTPUTS)?.header("source", slot).to_string())
}

fn shape_of(value: &AttributeValue) -> Result<StandardWaveform> {
    let symbol = value.as_str()?;
    symbol.parse().map_err(|_| Error::UnsupportedValue {
        attribute: attr::WAVEFORM.to_string(),
        value: symbol.to_string(),
    })
}

/// Query the base shape and, for the ramp family, classify by symmetry.
fn read_waveform(session: &mut Session, slot: usize) -> AttributeFuture<'_, AttributeValue> {
    Box::pin(async move {
        let source = source_header(session, slot)?;
        let reply = session.query(&format!(":{source}:function?")).await?;
        let spec = session.registry().find(attr::WAVEFORM)?;
        let value = session.registry().spec(spec).parse(&reply)?;
        let shape = shape_of(&value)?;
        if !shape.is_ramp_family() {
            return Ok(value);
        }
        let symmetry = session.get(attr::SYMMETRY, slot).await?.as_f64()?;
        let shape = classify_ramp(symmetry);
        debug!(slot, symmetry, %shape, "ramp shape classified");
        Ok(AttributeValue::Symbol(shape.symbol().to_string()))
    })
}

/// Send the shape token. Symmetry is handled by [`couple_waveform`].
fn write_waveform(
    session: &mut Session,
    slot: usize,
    value: AttributeValue,
) -> AttributeFuture<'_, ()> {
    Box::pin(async move {
        let shape = shape_of(&value)?;
        let source = source_header(session, slot)?;
        let spec = session.registry().find(attr::WAVEFORM)?;
        let command = {
            let translator = session
                .registry()
                .spec(spec)
                .translator
                .as_ref()
                .ok_or_else(|| Error::InvalidTable("waveform has no translator".into()))?;
            format!(":{source}:function {}", waveform_token(translator, shape)?)
        };
        session.write(&command).await
    })
}

/// Runs after every shape write: the device switches to function mode on
/// its own, and the ramp family pins symmetry.
pub(crate) fn couple_waveform(
    session: &mut Session,
    slot: usize,
    value: AttributeValue,
) -> AttributeFuture<'_, ()> {
    Box::pin(async move {
        session.store(attr::OUTPUT_MODE, slot, OutputMode::Function.symbol())?;
        let shape = shape_of(&value)?;
        if !shape.is_ramp_family() {
            return Ok(());
        }
        let current = match shape {
            StandardWaveform::Triangle => session.get(attr::SYMMETRY, slot).await?.as_f64()?,
            _ => f64::NAN,
        };
        if let Some(symmetry) = forced_symmetry(shape, current) {
            debug!(slot, %shape, symmetry, "forcing ramp symmetry");
            session.set(attr::SYMMETRY, slot, symmetry).await?;
        }
        Ok(())
    })
}
