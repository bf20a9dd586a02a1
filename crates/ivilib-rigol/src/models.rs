//! Rigol model definitions.
//!
//! Every model listed here carries the two-output waveform generator (WG)
//! option driven by this crate. The generator command set is identical
//! across the range; models differ in channel counts, bandwidth, and
//! whether a logic analyzer is fitted.
//!
//! | Model       | Analog | Digital | Bandwidth |
//! |-------------|--------|---------|-----------|
//! | DS1074Z     | 4      | 0       | 70 MHz    |
//! | DS1104Z     | 4      | 0       | 100 MHz   |
//! | DS1074ZPlus | 4      | 16      | 70 MHz    |
//! | DS1104ZPlus | 4      | 16      | 100 MHz   |
//! | MSO1074Z    | 4      | 16      | 70 MHz    |
//! | MSO1104Z    | 4      | 16      | 100 MHz   |
//! | DS2072A     | 2      | 0       | 70 MHz    |
//! | MSO2072A    | 2      | 16      | 70 MHz    |
//! | MSO5072     | 2      | 16      | 100 MHz   |
//! | MSO5074     | 4      | 16      | 100 MHz   |
//! | DS7014      | 4      | 0       | 100 MHz   |
//! | MSO7014     | 4      | 16      | 100 MHz   |
//! | MSO8064     | 4      | 16      | 600 MHz   |

use ivilib_core::{ArbitraryLimits, InstrumentClass, InstrumentDefinition, Manufacturer};

/// Static model definition for a Rigol oscilloscope with the WG option.
#[derive(Debug, Clone, PartialEq)]
pub struct RigolModel {
    /// Model name as printed on the front panel.
    pub name: &'static str,
    /// Number of analog input channels.
    pub analog_channels: usize,
    /// Number of logic analyzer channels.
    pub digital_channels: usize,
    /// Number of generator outputs.
    pub outputs: usize,
    /// Analog bandwidth in hertz.
    pub bandwidth_hz: f64,
    /// Arbitrary waveform memory limits of the generator.
    pub arbitrary: ArbitraryLimits,
}

impl RigolModel {
    /// Whether the model has a logic analyzer and so supports digital fetch.
    pub fn has_digital(&self) -> bool {
        self.digital_channels > 0
    }
}

impl From<&RigolModel> for InstrumentDefinition {
    fn from(model: &RigolModel) -> Self {
        InstrumentDefinition {
            manufacturer: Manufacturer::Rigol,
            model_name: model.name,
            class: InstrumentClass::Oscilloscope,
            analog_channels: model.analog_channels,
            digital_channels: model.digital_channels,
            outputs: model.outputs,
            bandwidth_hz: model.bandwidth_hz,
        }
    }
}

/// The WG option stores no waveforms of its own and does not report a
/// sample rate.
const WG_ARBITRARY: ArbitraryLimits = ArbitraryLimits {
    size_min: 2,
    size_max: 131_072,
    quantum: 1,
    max_waveforms: 0,
    sample_rate: None,
};

const fn wg_model(
    name: &'static str,
    analog_channels: usize,
    digital_channels: usize,
    bandwidth_hz: f64,
) -> RigolModel {
    RigolModel {
        name,
        analog_channels,
        digital_channels,
        outputs: 2,
        bandwidth_hz,
        arbitrary: WG_ARBITRARY,
    }
}

/// DS1074Z: 4 channels, 70 MHz.
pub fn ds1074z() -> RigolModel {
    wg_model("DS1074Z", 4, 0, 70e6)
}

/// DS1104Z: 4 channels, 100 MHz.
pub fn ds1104z() -> RigolModel {
    wg_model("DS1104Z", 4, 0, 100e6)
}

/// DS1074Z Plus: 4 channels, 70 MHz, logic analyzer ready.
pub fn ds1074z_plus() -> RigolModel {
    wg_model("DS1074ZPlus", 4, 16, 70e6)
}

/// DS1104Z Plus: 4 channels, 100 MHz, logic analyzer ready.
pub fn ds1104z_plus() -> RigolModel {
    wg_model("DS1104ZPlus", 4, 16, 100e6)
}

/// MSO1074Z: 4 + 16 channels, 70 MHz.
pub fn mso1074z() -> RigolModel {
    wg_model("MSO1074Z", 4, 16, 70e6)
}

/// MSO1104Z: 4 + 16 channels, 100 MHz.
pub fn mso1104z() -> RigolModel {
    wg_model("MSO1104Z", 4, 16, 100e6)
}

/// DS2072A: 2 channels, 70 MHz.
pub fn ds2072a() -> RigolModel {
    wg_model("DS2072A", 2, 0, 70e6)
}

/// MSO2072A: 2 + 16 channels, 70 MHz.
pub fn mso2072a() -> RigolModel {
    wg_model("MSO2072A", 2, 16, 70e6)
}

/// MSO5072: 2 + 16 channels, 100 MHz.
pub fn mso5072() -> RigolModel {
    wg_model("MSO5072", 2, 16, 100e6)
}

/// MSO5074: 4 + 16 channels, 100 MHz.
pub fn mso5074() -> RigolModel {
    wg_model("MSO5074", 4, 16, 100e6)
}

/// DS7014: 4 channels, 100 MHz.
pub fn ds7014() -> RigolModel {
    wg_model("DS7014", 4, 0, 100e6)
}

/// MSO7014: 4 + 16 channels, 100 MHz.
pub fn mso7014() -> RigolModel {
    wg_model("MSO7014", 4, 16, 100e6)
}

/// MSO8064: 4 + 16 channels, 600 MHz.
pub fn mso8064() -> RigolModel {
    wg_model("MSO8064", 4, 16, 600e6)
}

/// Every supported Rigol model.
pub fn all_rigol_models() -> Vec<RigolModel> {
    vec![
        ds1074z(),
        ds1104z(),
        ds1074z_plus(),
        ds1104z_plus(),
        mso1074z(),
        mso1104z(),
        ds2072a(),
        mso2072a(),
        mso5072(),
        mso5074(),
        ds7014(),
        mso7014(),
        mso8064(),
    ]
}

/// Look a model up by name, ASCII case-insensitively.
pub fn rigol_model(name: &str) -> Option<RigolModel> {
    all_rigol_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete_and_unique() {
        let models = all_rigol_models();
        assert_eq!(models.len(), 13);
        for (i, m) in models.iter().enumerate() {
            assert!(
                models[..i].iter().all(|o| o.name != m.name),
                "duplicate model {}",
                m.name
            );
            assert_eq!(m.outputs, 2);
            assert_eq!(m.arbitrary.size_max, 131_072);
        }
    }

    #[test]
    fn mso5072_layout() {
        let m = mso5072();
        assert_eq!(m.analog_channels, 2);
        assert_eq!(m.digital_channels, 16);
        assert_eq!(m.bandwidth_hz, 100e6);
        assert!(m.has_digital());
        assert!(!ds1104z().has_digital());
    }

    #[test]
    fn definition_conversion() {
        let def = InstrumentDefinition::from(&mso8064());
        assert_eq!(def.manufacturer, Manufacturer::Rigol);
        assert_eq!(def.model_name, "MSO8064");
        assert_eq!(def.class, InstrumentClass::Oscilloscope);
        assert_eq!(def.outputs, 2);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(rigol_model("mso5072").map(|m| m.name), Some("MSO5072"));
        assert!(rigol_model("DG1022").is_none());
    }
}
