//! Oscilloscope capabilities.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::index::{Index, IndexDomain};
use crate::trace::{AnalogTrace, DigitalTrace, WaveformPreamble};

/// Kind of the channel index domain.
pub const CHANNELS: &str = "channels";

/// Channel domain with analog `channel1..channelN` followed by digital
/// `d0..d(M-1)`.
pub fn channel_domain(analog: usize, digital: usize) -> Result<IndexDomain> {
    let mut names: Vec<String> = (1..=analog).map(|i| format!("channel{i}")).collect();
    names.extend((0..digital).map(|i| format!("d{i}")));
    IndexDomain::new(CHANNELS, names)
}

/// Parse the horizontal fields of a comma separated `:waveform:preamble?`
/// reply: x-increment at field 4, x-origin at 5, x-reference at 6.
pub fn parse_comma_preamble(reply: &str) -> Result<WaveformPreamble> {
    let fields: Vec<&str> = reply.trim().split(',').map(str::trim).collect();
    if fields.len() < 7 {
        return Err(Error::Protocol(format!(
            "preamble has {} fields, expected at least 7",
            fields.len()
        )));
    }
    let num = |i: usize| crate::helpers::parse_scpi_float(fields[i]);
    Ok(WaveformPreamble {
        x_increment: num(4)?,
        x_origin: num(5)?,
        x_reference: num(6)? as i64,
    })
}

/// Fetch a digital (logic) capture.
#[async_trait]
pub trait DigitalWaveformFetch: Send + Sync {
    /// Decoded sample type.
    type Sample: Send;

    /// Select `source`, read its preamble and samples. Returns an empty
    /// trace without I/O in simulate mode.
    async fn fetch_waveform_digital(&self, source: Index) -> Result<DigitalTrace<Self::Sample>>;
}

/// Fetch an analog capture.
#[async_trait]
pub trait AnalogWaveformFetch: Send + Sync {
    /// Select `channel`, read its preamble and samples. Returns an empty
    /// trace without I/O in simulate mode.
    async fn fetch_waveform(&self, channel: Index) -> Result<AnalogTrace>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_domain_layout() {
        let d = channel_domain(2, 16).unwrap();
        assert_eq!(d.len(), 18);
        assert_eq!(d.name(0), "channel1");
        assert_eq!(d.name(2), "d0");
        assert_eq!(d.resolve(&"D15".into()).unwrap(), 17);
    }

    #[test]
    fn comma_preamble_positions() {
        let p = parse_comma_preamble("0,2,1200,1,1.000000e-06,-6.0e-04,0,1,0,128\n").unwrap();
        assert_eq!(p.x_increment, 1e-6);
        assert_eq!(p.x_origin, -6e-4);
        assert_eq!(p.x_reference, 0);
    }

    #[test]
    fn short_preamble_is_protocol_error() {
        assert!(matches!(
            parse_comma_preamble("0,2,1200"),
            Err(Error::Protocol(_))
        ));
    }
}
