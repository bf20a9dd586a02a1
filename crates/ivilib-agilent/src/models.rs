//! Agilent Infiniium model definitions.

use ivilib_core::{InstrumentClass, InstrumentDefinition, Manufacturer};

/// Static model definition for an Infiniium oscilloscope.
#[derive(Debug, Clone, PartialEq)]
pub struct AgilentModel {
    /// Model name as printed on the front panel.
    pub name: &'static str,
    /// Number of analog input channels.
    pub analog_channels: usize,
    /// Number of logic analyzer channels.
    pub digital_channels: usize,
    /// Analog bandwidth in hertz.
    pub bandwidth_hz: f64,
}

impl From<&AgilentModel> for InstrumentDefinition {
    fn from(model: &AgilentModel) -> Self {
        InstrumentDefinition {
            manufacturer: Manufacturer::Agilent,
            model_name: model.name,
            class: InstrumentClass::Oscilloscope,
            analog_channels: model.analog_channels,
            digital_channels: model.digital_channels,
            outputs: 0,
            bandwidth_hz: model.bandwidth_hz,
        }
    }
}

/// MSO9064A: 4 + 16 channels, 600 MHz.
pub fn mso9064a() -> AgilentModel {
    AgilentModel {
        name: "MSO9064A",
        analog_channels: 4,
        digital_channels: 16,
        bandwidth_hz: 600e6,
    }
}

/// Every supported Agilent model.
pub fn all_agilent_models() -> Vec<AgilentModel> {
    vec![mso9064a()]
}

/// Look a model up by name, ASCII case-insensitively.
pub fn agilent_model(name: &str) -> Option<AgilentModel> {
    all_agilent_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mso9064a_layout() {
        let m = mso9064a();
        assert_eq!(m.analog_channels, 4);
        assert_eq!(m.digital_channels, 16);
        assert_eq!(m.bandwidth_hz, 600e6);
    }

    #[test]
    fn definition_has_no_outputs() {
        let def = InstrumentDefinition::from(&mso9064a());
        assert_eq!(def.manufacturer, Manufacturer::Agilent);
        assert_eq!(def.outputs, 0);
        assert_eq!(agilent_model("mso9064a").map(|m| m.name), Some("MSO9064A"));
    }
}
