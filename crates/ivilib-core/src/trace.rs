//! Captured waveform traces.
//!
//! A trace pairs raw samples with the horizontal scaling from the
//! instrument's preamble. Sample times are computed on demand by the
//! iterators; nothing is materialized up front.

/// Horizontal scaling shared by every trace type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformPreamble {
    /// Seconds between consecutive samples.
    pub x_increment: f64,
    /// Time of the reference sample, in seconds.
    pub x_origin: f64,
    /// Index of the reference sample.
    pub x_reference: i64,
}

impl WaveformPreamble {
    /// Time of sample `index`: `(index - x_reference) * x_increment + x_origin`.
    pub fn time_at(&self, index: usize) -> f64 {
        (index as i64 - self.x_reference) as f64 * self.x_increment + self.x_origin
    }
}

impl Default for WaveformPreamble {
    fn default() -> Self {
        WaveformPreamble {
            x_increment: 0.0,
            x_origin: 0.0,
            x_reference: 0,
        }
    }
}

/// A digital (logic analyzer) capture.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalTrace<S = u8> {
    preamble: WaveformPreamble,
    samples: Vec<S>,
}

impl<S> DigitalTrace<S> {
    /// Build a trace from decoded samples.
    pub fn new(preamble: WaveformPreamble, samples: Vec<S>) -> Self {
        DigitalTrace { preamble, samples }
    }

    /// The empty trace returned in simulate mode.
    pub fn empty() -> Self {
        DigitalTrace {
            preamble: WaveformPreamble::default(),
            samples: Vec::new(),
        }
    }

    /// Horizontal scaling.
    pub fn preamble(&self) -> &WaveformPreamble {
        &self.preamble
    }

    /// Raw samples.
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the trace holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lazily yield `(time, sample)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &S)> + '_ {
        let pre = self.preamble;
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, s)| (pre.time_at(i), s))
    }
}

/// Vertical scaling of an analog capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalScale {
    /// Volts per digitizer level.
    pub y_multiplier: f64,
    /// Digitizer level offset subtracted before scaling.
    pub y_offset: f64,
    /// Volts added after scaling.
    pub y_zero: f64,
}

impl VerticalScale {
    /// Convert a raw digitizer value to volts.
    pub fn volts(&self, raw: f64) -> f64 {
        (raw - self.y_offset) * self.y_multiplier + self.y_zero
    }
}

impl Default for VerticalScale {
    fn default() -> Self {
        VerticalScale {
            y_multiplier: 1.0,
            y_offset: 0.0,
            y_zero: 0.0,
        }
    }
}

/// An analog capture: raw digitizer values plus both scalings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogTrace {
    preamble: WaveformPreamble,
    vertical: VerticalScale,
    raw: Vec<f64>,
}

impl AnalogTrace {
    /// Build a trace from decoded raw values.
    pub fn new(preamble: WaveformPreamble, vertical: VerticalScale, raw: Vec<f64>) -> Self {
        AnalogTrace {
            preamble,
            vertical,
            raw,
        }
    }

    /// The empty trace returned in simulate mode.
    pub fn empty() -> Self {
        AnalogTrace::new(WaveformPreamble::default(), VerticalScale::default(), Vec::new())
    }

    /// Horizontal scaling.
    pub fn preamble(&self) -> &WaveformPreamble {
        &self.preamble
    }

    /// Vertical scaling.
    pub fn vertical(&self) -> &VerticalScale {
        &self.vertical
    }

    /// Raw digitizer values, unscaled.
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the trace holds no samples.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Lazily yield `(time, volts)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let pre = self.preamble;
        let vert = self.vertical;
        self.raw
            .iter()
            .enumerate()
            .map(move |(i, r)| (pre.time_at(i), vert.volts(*r)))
    }
}
