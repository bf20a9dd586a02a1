//! Tektronix DPO model definitions.
//!
//! | Model    | Series  | Analog | Bandwidth |
//! |----------|---------|--------|-----------|
//! | DPO7354C | DPO7000 | 4      | 3.5 GHz   |
//! | DPO3034  | DPO3000 | 4      | 1 GHz     |
//! | DPO3014  | DPO3000 | 4      | 1 GHz     |
//!
//! Only the DPO7000 series exposes the horizontal acquisition attributes
//! and screen capture.

use ivilib_core::{InstrumentClass, InstrumentDefinition, Manufacturer};

/// Product series, which decides the available command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TektronixSeries {
    /// DPO7000: waveform fetch plus horizontal mode, roll, scale, record
    /// length and sample rate.
    Dpo7000,
    /// DPO3000: waveform fetch only.
    Dpo3000,
}

/// Static model definition for a Tektronix DPO oscilloscope.
#[derive(Debug, Clone, PartialEq)]
pub struct TektronixModel {
    /// Model name as printed on the front panel.
    pub name: &'static str,
    /// Product series.
    pub series: TektronixSeries,
    /// Number of analog input channels.
    pub analog_channels: usize,
    /// Analog bandwidth in hertz.
    pub bandwidth_hz: f64,
}

impl TektronixModel {
    /// Whether the horizontal acquisition attributes are available.
    pub fn has_horizontal_control(&self) -> bool {
        self.series == TektronixSeries::Dpo7000
    }

    /// Whether the screen can be captured with [`fetch_screenshot`].
    ///
    /// [`fetch_screenshot`]: crate::TektronixInstrument::fetch_screenshot
    pub fn has_screenshot(&self) -> bool {
        self.series == TektronixSeries::Dpo7000
    }
}

impl From<&TektronixModel> for InstrumentDefinition {
    fn from(model: &TektronixModel) -> Self {
        InstrumentDefinition {
            manufacturer: Manufacturer::Tektronix,
            model_name: model.name,
            class: InstrumentClass::Oscilloscope,
            analog_channels: model.analog_channels,
            digital_channels: 0,
            outputs: 0,
            bandwidth_hz: model.bandwidth_hz,
        }
    }
}

/// DPO7354C: 4 channels, 3.5 GHz.
pub fn dpo7354c() -> TektronixModel {
    TektronixModel {
        name: "DPO7354C",
        series: TektronixSeries::Dpo7000,
        analog_channels: 4,
        bandwidth_hz: 3.5e9,
    }
}

/// DPO3034: 4 channels, series bandwidth 1 GHz.
pub fn dpo3034() -> TektronixModel {
    TektronixModel {
        name: "DPO3034",
        series: TektronixSeries::Dpo3000,
        analog_channels: 4,
        bandwidth_hz: 1e9,
    }
}

/// DPO3014: 4 channels, series bandwidth 1 GHz.
pub fn dpo3014() -> TektronixModel {
    TektronixModel {
        name: "DPO3014",
        series: TektronixSeries::Dpo3000,
        analog_channels: 4,
        bandwidth_hz: 1e9,
    }
}

/// Every supported Tektronix model.
pub fn all_tektronix_models() -> Vec<TektronixModel> {
    vec![dpo7354c(), dpo3034(), dpo3014()]
}

/// Look a model up by name, ASCII case-insensitively.
pub fn tektronix_model(name: &str) -> Option<TektronixModel> {
    all_tektronix_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_capabilities() {
        assert!(dpo7354c().has_horizontal_control());
        assert!(!dpo3034().has_horizontal_control());
        assert!(!dpo3014().has_horizontal_control());
    }

    #[test]
    fn definitions() {
        let def = InstrumentDefinition::from(&dpo7354c());
        assert_eq!(def.manufacturer, Manufacturer::Tektronix);
        assert_eq!(def.analog_channels, 4);
        assert_eq!(def.bandwidth_hz, 3.5e9);
        assert_eq!(tektronix_model("dpo3014").map(|m| m.series), Some(TektronixSeries::Dpo3000));
    }
}
