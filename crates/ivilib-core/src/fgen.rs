//! Function generator capabilities.
//!
//! [`FunctionGenerator`] exposes the standard attribute names as typed
//! accessors. The defaults go through the driver's attribute table, so a
//! backend only needs to provide [`instrument()`](FunctionGenerator::instrument)
//! and override the bulk operations it supports.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::index::Index;
use crate::session::Instrument;
use crate::types::{OutputImpedance, OutputMode, StandardWaveform};

/// Kind of the output index domain.
pub const OUTPUTS: &str = "outputs";

/// Standard attribute names.
pub mod attr {
    /// Output on/off, bool.
    pub const OUTPUT_ENABLED: &str = "output.enabled";
    /// Load impedance, symbol.
    pub const OUTPUT_IMPEDANCE: &str = "output.impedance";
    /// `function` or `arbitrary`, symbol.
    pub const OUTPUT_MODE: &str = "output.mode";
    /// Operation mode, symbol.
    pub const OUTPUT_OPERATION_MODE: &str = "output.operation_mode";
    /// Reference clock source, symbol.
    pub const OUTPUT_REFERENCE_CLOCK_SOURCE: &str = "output.reference_clock_source";
    /// Standard waveform shape, symbol.
    pub const WAVEFORM: &str = "output.standard_waveform.waveform";
    /// Frequency in hertz.
    pub const FREQUENCY: &str = "output.standard_waveform.frequency";
    /// Start phase in degrees.
    pub const START_PHASE: &str = "output.standard_waveform.start_phase";
    /// Ramp symmetry in percent.
    pub const SYMMETRY: &str = "output.standard_waveform.symmetry";
    /// Amplitude in volts.
    pub const AMPLITUDE: &str = "output.standard_waveform.amplitude";
    /// DC offset in volts.
    pub const DC_OFFSET: &str = "output.standard_waveform.dc_offset";
    /// Square/pulse duty cycle in percent.
    pub const DUTY_CYCLE_HIGH: &str = "output.standard_waveform.duty_cycle_high";
}

/// A complete standard waveform configuration.
///
/// `frequency` and `start_phase` are `None` for waveform families that do
/// not have them (noise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardWaveformSettings {
    /// Shape.
    pub waveform: StandardWaveform,
    /// Frequency in hertz.
    pub frequency: Option<f64>,
    /// Amplitude in volts.
    pub amplitude: f64,
    /// DC offset in volts.
    pub dc_offset: f64,
    /// Start phase in degrees.
    pub start_phase: Option<f64>,
}

/// Arbitrary waveform memory limits of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitraryLimits {
    /// Smallest accepted waveform, in samples.
    pub size_min: usize,
    /// Largest accepted waveform, in samples.
    pub size_max: usize,
    /// Waveform lengths must be a multiple of this.
    pub quantum: usize,
    /// Number of stored waveform slots.
    pub max_waveforms: usize,
    /// Fixed arbitrary sample rate, when the model reports one.
    pub sample_rate: Option<f64>,
}

impl ArbitraryLimits {
    /// Check a normalized waveform against these limits.
    pub fn validate(&self, samples: &[f64]) -> Result<()> {
        let n = samples.len();
        if n < self.size_min || n > self.size_max {
            return Err(Error::OutOfRange {
                attribute: "arbitrary.waveform.size".into(),
                value: n as f64,
                min: self.size_min as f64,
                max: self.size_max as f64,
            });
        }
        if self.quantum > 1 && n % self.quantum != 0 {
            return Err(Error::InvalidParameter(format!(
                "waveform length {n} is not a multiple of {}",
                self.quantum
            )));
        }
        if let Some((i, s)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| !(-1.0..=1.0).contains(*s))
        {
            return Err(Error::OutOfRange {
                attribute: format!("arbitrary.waveform[{i}]"),
                value: *s,
                min: -1.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

fn symbol_to<T: std::str::FromStr>(attribute: &str, symbol: &str) -> Result<T> {
    symbol.parse().map_err(|_| Error::UnsupportedValue {
        attribute: attribute.to_string(),
        value: symbol.to_string(),
    })
}

/// Unified asynchronous interface for waveform generators.
#[async_trait]
pub trait FunctionGenerator: Send + Sync {
    /// The attribute session backing this generator.
    fn instrument(&self) -> &Instrument;

    /// Whether the output is switched on.
    async fn output_enabled(&self, output: Index) -> Result<bool> {
        self.instrument()
            .get(attr::OUTPUT_ENABLED, output)
            .await?
            .as_bool()
    }

    /// Switch the output on or off.
    async fn set_output_enabled(&self, output: Index, on: bool) -> Result<()> {
        self.instrument().set(attr::OUTPUT_ENABLED, output, on).await
    }

    /// Load impedance.
    async fn output_impedance(&self, output: Index) -> Result<OutputImpedance> {
        let v = self.instrument().get(attr::OUTPUT_IMPEDANCE, output).await?;
        symbol_to(attr::OUTPUT_IMPEDANCE, v.as_str()?)
    }

    /// Set the load impedance.
    async fn set_output_impedance(&self, output: Index, load: OutputImpedance) -> Result<()> {
        self.instrument()
            .set(attr::OUTPUT_IMPEDANCE, output, load.symbol())
            .await
    }

    /// Output mode.
    async fn output_mode(&self, output: Index) -> Result<OutputMode> {
        let v = self.instrument().get(attr::OUTPUT_MODE, output).await?;
        symbol_to(attr::OUTPUT_MODE, v.as_str()?)
    }

    /// Standard waveform shape.
    async fn waveform(&self, output: Index) -> Result<StandardWaveform> {
        let v = self.instrument().get(attr::WAVEFORM, output).await?;
        symbol_to(attr::WAVEFORM, v.as_str()?)
    }

    /// Select a standard waveform shape.
    async fn set_waveform(&self, output: Index, waveform: StandardWaveform) -> Result<()> {
        self.instrument()
            .set(attr::WAVEFORM, output, waveform.symbol())
            .await
    }

    /// Frequency in hertz.
    async fn frequency(&self, output: Index) -> Result<f64> {
        self.instrument().get(attr::FREQUENCY, output).await?.as_f64()
    }

    /// Set the frequency in hertz.
    async fn set_frequency(&self, output: Index, hz: f64) -> Result<()> {
        self.instrument().set(attr::FREQUENCY, output, hz).await
    }

    /// Amplitude in volts.
    async fn amplitude(&self, output: Index) -> Result<f64> {
        self.instrument().get(attr::AMPLITUDE, output).await?.as_f64()
    }

    /// Set the amplitude in volts.
    async fn set_amplitude(&self, output: Index, volts: f64) -> Result<()> {
        self.instrument().set(attr::AMPLITUDE, output, volts).await
    }

    /// DC offset in volts.
    async fn dc_offset(&self, output: Index) -> Result<f64> {
        self.instrument().get(attr::DC_OFFSET, output).await?.as_f64()
    }

    /// Set the DC offset in volts.
    async fn set_dc_offset(&self, output: Index, volts: f64) -> Result<()> {
        self.instrument().set(attr::DC_OFFSET, output, volts).await
    }

    /// Start phase in degrees.
    async fn start_phase(&self, output: Index) -> Result<f64> {
        self.instrument().get(attr::START_PHASE, output).await?.as_f64()
    }

    /// Set the start phase in degrees.
    async fn set_start_phase(&self, output: Index, degrees: f64) -> Result<()> {
        self.instrument().set(attr::START_PHASE, output, degrees).await
    }

    /// Ramp symmetry in percent.
    async fn symmetry(&self, output: Index) -> Result<f64> {
        self.instrument().get(attr::SYMMETRY, output).await?.as_f64()
    }

    /// Set the ramp symmetry in percent.
    async fn set_symmetry(&self, output: Index, percent: f64) -> Result<()> {
        self.instrument().set(attr::SYMMETRY, output, percent).await
    }

    /// Duty cycle in percent.
    async fn duty_cycle_high(&self, output: Index) -> Result<f64> {
        self.instrument()
            .get(attr::DUTY_CYCLE_HIGH, output)
            .await?
            .as_f64()
    }

    /// Set the duty cycle in percent.
    async fn set_duty_cycle_high(&self, output: Index, percent: f64) -> Result<()> {
        self.instrument()
            .set(attr::DUTY_CYCLE_HIGH, output, percent)
            .await
    }

    /// Read every standard waveform setting of an output in one exchange.
    async fn read_output_settings(&self, _output: Index) -> Result<StandardWaveformSettings> {
        Err(Error::Unsupported("bulk settings read not supported".into()))
    }

    /// Apply a complete standard waveform configuration in one exchange.
    async fn configure_standard_waveform(
        &self,
        _output: Index,
        _settings: StandardWaveformSettings,
    ) -> Result<()> {
        Err(Error::Unsupported(
            "bulk waveform configuration not supported".into(),
        ))
    }

    /// Arbitrary waveform limits.
    fn arbitrary_limits(&self) -> Result<ArbitraryLimits> {
        Err(Error::Unsupported("arbitrary waveforms not supported".into()))
    }

    /// Check a normalized waveform against the model's limits.
    fn validate_arbitrary_waveform(&self, samples: &[f64]) -> Result<()> {
        self.arbitrary_limits()?.validate(samples)
    }

    /// Store an arbitrary waveform and return its handle.
    async fn create_arbitrary_waveform(&self, samples: &[f64]) -> Result<usize> {
        let limits = self.arbitrary_limits()?;
        limits.validate(samples)?;
        if limits.max_waveforms == 0 {
            return Err(Error::Unsupported(
                "model has no stored waveform slots".into(),
            ));
        }
        Err(Error::Unsupported("waveform upload not supported".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ArbitraryLimits {
        ArbitraryLimits {
            size_min: 2,
            size_max: 8,
            quantum: 2,
            max_waveforms: 0,
            sample_rate: None,
        }
    }

    #[test]
    fn size_bounds() {
        assert!(limits().validate(&[0.0, 0.5]).is_ok());
        assert!(matches!(
            limits().validate(&[0.0]),
            Err(Error::OutOfRange { .. })
        ));
        assert!(limits().validate(&[0.0; 10]).is_err());
    }

    #[test]
    fn quantum_enforced() {
        assert!(matches!(
            limits().validate(&[0.0, 0.1, 0.2]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn samples_must_be_normalized() {
        let err = limits().validate(&[0.0, 1.5]).unwrap_err();
        assert!(err.to_string().contains("arbitrary.waveform[1]"));
        assert!(limits().validate(&[-1.0, 1.0]).is_ok());
    }
}
