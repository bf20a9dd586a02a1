//! Rigol WG command builders and reply parsers.
//!
//! Pure functions: they build command strings and decode replies without
//! performing I/O. Attribute access for single values is table driven (see
//! [`attributes`](crate::attributes)); this module covers the multi-field
//! `APPLY` exchange and the waveform shape tokens.
//!
//! # APPLY field layout
//!
//! `:sourceN:apply?` answers with a comma separated tuple whose layout
//! depends on the waveform family. Most families report
//! `type, frequency, amplitude, offset, phase`; noise has no frequency or
//! phase, and the firmware puts placeholders in those positions. The
//! layout is looked up per family in [`APPLY_SCHEMAS`] rather than special
//! cased, so a family with another layout only needs a new table row.

use ivilib_core::{
    Error, Result, StandardWaveform, StandardWaveformSettings, ValueTranslator,
    format_scientific, parse_scpi_float,
};

/// One position of an APPLY tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyField {
    /// Device waveform token.
    Type,
    /// Frequency in hertz.
    Frequency,
    /// Amplitude in volts.
    Amplitude,
    /// DC offset in volts.
    Offset,
    /// Start phase in degrees.
    Phase,
    /// Present in the reply but meaningless for this family.
    Ignored,
}

/// APPLY layout of one waveform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplySchema {
    /// Keyword after `APPLY:` in the write form.
    pub keyword: &'static str,
    /// Positions of the `apply?` reply.
    pub read: &'static [ApplyField],
    /// Arguments of the `APPLY:<keyword>` command, in order.
    pub write: &'static [ApplyField],
}

impl ApplySchema {
    /// Whether this family carries a frequency.
    pub fn has_frequency(&self) -> bool {
        self.write.contains(&ApplyField::Frequency)
    }

    /// Whether this family carries a start phase.
    pub fn has_phase(&self) -> bool {
        self.write.contains(&ApplyField::Phase)
    }
}

use ApplyField::{Amplitude, Frequency, Ignored, Offset, Phase, Type};

const PERIODIC_READ: &[ApplyField] = &[Type, Frequency, Amplitude, Offset, Phase];
const PERIODIC_WRITE: &[ApplyField] = &[Frequency, Amplitude, Offset, Phase];

/// Families whose layout differs from the periodic default.
pub const APPLY_SCHEMAS: &[(StandardWaveform, ApplySchema)] = &[(
    StandardWaveform::Noise,
    ApplySchema {
        keyword: "NOISE",
        read: &[Type, Ignored, Amplitude, Offset, Ignored],
        write: &[Amplitude, Offset],
    },
)];

/// APPLY layout for `waveform`. `keyword` of the periodic default is the
/// waveform's device token, filled in by [`apply_command`].
pub fn apply_schema(waveform: StandardWaveform) -> ApplySchema {
    APPLY_SCHEMAS
        .iter()
        .find(|(w, _)| *w == waveform)
        .map(|(_, s)| *s)
        .unwrap_or(ApplySchema {
            keyword: "",
            read: PERIODIC_READ,
            write: PERIODIC_WRITE,
        })
}

/// Neutral waveform symbol <-> Rigol function token.
///
/// The ramp family shares the single `RAMP` token, which reads back as
/// `ramp_up` until symmetry classifies it. A generator left in arbitrary
/// mode answers `ARB`; that reads as `sine`.
pub fn waveform_translator() -> Result<ValueTranslator> {
    ValueTranslator::new(
        "waveform",
        &[
            ("sine", "SIN"),
            ("square", "SQU"),
            ("ramp_up", "RAMP"),
            ("pulse", "PULS"),
            ("noise", "NOIS"),
            ("dc", "DC"),
            ("sinc", "SINC"),
            ("exp_rise", "EXPR"),
            ("exp_fall", "EXPF"),
            ("cardiac", "ECG"),
            ("gaussian", "GAUS"),
            ("lorentz", "LOR"),
            ("haversine", "HAV"),
        ],
    )?
    .with_alias("ARB", "sine")?
    .with_alias("ARBITRARY", "sine")?
    .with_alias("NOISE", "noise")
}

/// Load impedance symbol <-> Rigol token. Firmware answers the short
/// `FIFT` but only accepts `FIFTY` on write.
pub fn impedance_translator() -> Result<ValueTranslator> {
    ValueTranslator::new("impedance", &[("HighZ", "OMEG"), ("50Ohms", "FIFTY")])?
        .with_alias("FIFT", "50Ohms")
}

/// The device token sent for `waveform`. Triangle and both ramps go out as
/// the ramp token; symmetry tells them apart.
pub fn waveform_token(translator: &ValueTranslator, waveform: StandardWaveform) -> Result<&str> {
    let symbol = if waveform.is_ramp_family() {
        StandardWaveform::RampUp.symbol()
    } else {
        waveform.symbol()
    };
    translator.to_device(symbol)
}

/// Classify a ramp-family shape from its symmetry percentage.
pub fn classify_ramp(symmetry: f64) -> StandardWaveform {
    if symmetry <= 10.0 {
        StandardWaveform::RampDown
    } else if symmetry >= 90.0 {
        StandardWaveform::RampUp
    } else {
        StandardWaveform::Triangle
    }
}

/// Symmetry a shape write forces, given the current symmetry.
///
/// Ramp up forces 100 %, ramp down 0 %. Triangle forces 50 % only when the
/// current symmetry would classify as a ramp.
pub fn forced_symmetry(waveform: StandardWaveform, current: f64) -> Option<f64> {
    match waveform {
        StandardWaveform::RampUp => Some(100.0),
        StandardWaveform::RampDown => Some(0.0),
        StandardWaveform::Triangle if current <= 10.0 || current >= 90.0 => Some(50.0),
        _ => None,
    }
}

/// Build `:{source}:apply?`.
pub fn apply_query(source: &str) -> String {
    format!(":{source}:apply?")
}

/// Build the `APPLY` write form for `settings`.
///
/// Periodic families send `:{source}:APPLY:<TYPE> f, a, o, p`; noise sends
/// `:{source}:APPLY:NOISE a, o`. Fails with [`Error::InvalidParameter`]
/// when the family needs a frequency or phase that `settings` lacks.
pub fn apply_command(
    translator: &ValueTranslator,
    source: &str,
    settings: &StandardWaveformSettings,
) -> Result<String> {
    let schema = apply_schema(settings.waveform);
    let keyword = if schema.keyword.is_empty() {
        waveform_token(translator, settings.waveform)?
    } else {
        schema.keyword
    };
    let mut args = Vec::with_capacity(schema.write.len());
    for field in schema.write {
        let value = match field {
            Frequency => settings.frequency.ok_or_else(|| {
                Error::InvalidParameter(format!("{} requires a frequency", settings.waveform))
            })?,
            Phase => settings.start_phase.ok_or_else(|| {
                Error::InvalidParameter(format!("{} requires a start phase", settings.waveform))
            })?,
            Amplitude => settings.amplitude,
            Offset => settings.dc_offset,
            Type | Ignored => continue,
        };
        args.push(format_scientific(value));
    }
    Ok(format!(":{source}:APPLY:{keyword} {}", args.join(", ")))
}

/// Decode an `apply?` reply.
///
/// The type field is translated through `translator`; a ramp-family shape
/// comes back as `ramp_up` and still needs symmetry classification.
/// Surrounding quotes are tolerated. Fails with [`Error::Protocol`] when
/// the tuple is shorter than the family's layout or a number does not
/// parse.
pub fn parse_apply(
    translator: &ValueTranslator,
    reply: &str,
) -> Result<StandardWaveformSettings> {
    let fields: Vec<&str> = reply
        .trim()
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .collect();
    let waveform = translator
        .from_device(fields[0])?
        .parse::<StandardWaveform>()
        .map_err(|e| Error::Protocol(format!("apply reply: {e}")))?;
    let schema = apply_schema(waveform);
    if fields.len() < schema.read.len() {
        return Err(Error::Protocol(format!(
            "apply reply {reply:?} has {} fields, {waveform} needs {}",
            fields.len(),
            schema.read.len()
        )));
    }

    let mut settings = StandardWaveformSettings {
        waveform,
        frequency: None,
        amplitude: 0.0,
        dc_offset: 0.0,
        start_phase: None,
    };
    for (field, text) in schema.read.iter().zip(&fields) {
        match field {
            Frequency => settings.frequency = Some(parse_scpi_float(text)?),
            Amplitude => settings.amplitude = parse_scpi_float(text)?,
            Offset => settings.dc_offset = parse_scpi_float(text)?,
            Phase => settings.start_phase = Some(parse_scpi_float(text)?),
            Type | Ignored => {}
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64) -> StandardWaveformSettings {
        StandardWaveformSettings {
            waveform: StandardWaveform::Sine,
            frequency: Some(frequency),
            amplitude: 2.0,
            dc_offset: 0.5,
            start_phase: Some(90.0),
        }
    }

    #[test]
    fn translator_tokens_round_trip() {
        let t = waveform_translator().unwrap();
        for token in t.tokens() {
            let symbol = t.from_device(token).unwrap();
            assert_eq!(t.to_device(symbol).unwrap(), token);
        }
        let z = impedance_translator().unwrap();
        for token in z.tokens() {
            assert_eq!(z.to_device(z.from_device(token).unwrap()).unwrap(), token);
        }
    }

    #[test]
    fn arbitrary_reads_as_sine() {
        let t = waveform_translator().unwrap();
        assert_eq!(t.from_device("ARB").unwrap(), "sine");
        assert_eq!(t.from_device("arbitrary").unwrap(), "sine");
        assert_eq!(t.to_device("sine").unwrap(), "SIN");
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let t = waveform_translator().unwrap();
        assert!(matches!(
            t.from_device("HARM"),
            Err(Error::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn ramp_family_shares_token() {
        let t = waveform_translator().unwrap();
        for w in [
            StandardWaveform::Triangle,
            StandardWaveform::RampUp,
            StandardWaveform::RampDown,
        ] {
            assert_eq!(waveform_token(&t, w).unwrap(), "RAMP");
        }
        assert_eq!(waveform_token(&t, StandardWaveform::Cardiac).unwrap(), "ECG");
    }

    #[test]
    fn ramp_classification_thresholds() {
        assert_eq!(classify_ramp(5.0), StandardWaveform::RampDown);
        assert_eq!(classify_ramp(10.0), StandardWaveform::RampDown);
        assert_eq!(classify_ramp(10.1), StandardWaveform::Triangle);
        assert_eq!(classify_ramp(50.0), StandardWaveform::Triangle);
        assert_eq!(classify_ramp(90.0), StandardWaveform::RampUp);
        assert_eq!(classify_ramp(95.0), StandardWaveform::RampUp);
    }

    #[test]
    fn forced_symmetry_rules() {
        assert_eq!(forced_symmetry(StandardWaveform::RampUp, 50.0), Some(100.0));
        assert_eq!(forced_symmetry(StandardWaveform::RampDown, 50.0), Some(0.0));
        assert_eq!(forced_symmetry(StandardWaveform::Triangle, 95.0), Some(50.0));
        assert_eq!(forced_symmetry(StandardWaveform::Triangle, 10.0), Some(50.0));
        assert_eq!(forced_symmetry(StandardWaveform::Triangle, 50.0), None);
        assert_eq!(forced_symmetry(StandardWaveform::Sine, 95.0), None);
    }

    #[test]
    fn apply_command_periodic() {
        let t = waveform_translator().unwrap();
        assert_eq!(
            apply_command(&t, "source1", &sine(1000.0)).unwrap(),
            ":source1:APPLY:SIN 1.000000e+03, 2.000000e+00, 5.000000e-01, 9.000000e+01"
        );
    }

    #[test]
    fn apply_command_noise_drops_frequency_and_phase() {
        let t = waveform_translator().unwrap();
        let settings = StandardWaveformSettings {
            waveform: StandardWaveform::Noise,
            frequency: None,
            amplitude: 1.0,
            dc_offset: 0.0,
            start_phase: None,
        };
        assert_eq!(
            apply_command(&t, "source2", &settings).unwrap(),
            ":source2:APPLY:NOISE 1.000000e+00, 0.000000e+00"
        );
    }

    #[test]
    fn apply_command_requires_frequency() {
        let t = waveform_translator().unwrap();
        let mut settings = sine(1000.0);
        settings.frequency = None;
        assert!(matches!(
            apply_command(&t, "source1", &settings),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn parse_apply_periodic() {
        let t = waveform_translator().unwrap();
        let s = parse_apply(
            &t,
            "\"SQU,2.000000E+03,1.000000E+00,-5.000000E-01,4.500000E+01\"\n",
        )
        .unwrap();
        assert_eq!(s.waveform, StandardWaveform::Square);
        assert_eq!(s.frequency, Some(2000.0));
        assert_eq!(s.amplitude, 1.0);
        assert_eq!(s.dc_offset, -0.5);
        assert_eq!(s.start_phase, Some(45.0));
    }

    #[test]
    fn parse_apply_noise_ignores_placeholders() {
        let t = waveform_translator().unwrap();
        let s = parse_apply(&t, "NOIS,DEF,3.000000E-01,1.000000E-01,DEF").unwrap();
        assert_eq!(s.waveform, StandardWaveform::Noise);
        assert_eq!(s.frequency, None);
        assert_eq!(s.start_phase, None);
        assert_eq!(s.amplitude, 0.3);
        assert_eq!(s.dc_offset, 0.1);
    }

    #[test]
    fn parse_apply_short_tuple_is_protocol_error() {
        let t = waveform_translator().unwrap();
        assert!(matches!(
            parse_apply(&t, "SIN,1.0E+03,1.0"),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            parse_apply(&t, "SIN,abc,1.0,0.0,0.0"),
            Err(Error::Protocol(_))
        ));
    }
}
