//! `:wfmoutpre?` preamble parsing and `:curve?` sample decoding.
//!
//! The preamble is semicolon separated. Fields used, by position:
//!
//! | Pos | Field    | Meaning                              |
//! |-----|----------|--------------------------------------|
//! | 0   | BYT_NR   | bytes per point                      |
//! | 2   | ENCDG    | must be `BINARY`                     |
//! | 3   | BN_FMT   | `RP` unsigned, `RI` signed, `FP` float |
//! | 4   | BYT_OR   | `MSB` or `LSB` first                 |
//! | 6   | NR_PT    | number of points                     |
//! | 7   | PT_FMT   | must be `Y`                          |
//! | 9   | XINCR    | seconds per point                    |
//! | 10  | XZERO    | time of the reference point          |
//! | 11  | PT_OFF   | reference point index                |
//! | 13  | YMULT    | volts per level                      |
//! | 14  | YOFF     | level offset                         |
//! | 15  | YZERO    | volts offset                         |

use bytes::Buf;

use ivilib_core::{
    Error, Result, VerticalScale, WaveformPreamble, parse_scpi_float, parse_scpi_int,
};

/// Sample encoding of a binary curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Signed 8-bit.
    I8,
    /// Signed 16-bit.
    I16,
    /// IEEE 754 single precision, already in volts.
    F32,
}

impl SampleFormat {
    /// Bytes per sample.
    pub fn width(&self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => 1,
            SampleFormat::U16 | SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
        }
    }

    fn from_fields(bn_fmt: &str, point_size: i64) -> Result<Self> {
        match (bn_fmt, point_size) {
            ("RP", 1) => Ok(SampleFormat::U8),
            ("RP", 2) => Ok(SampleFormat::U16),
            ("RI", 1) => Ok(SampleFormat::I8),
            ("RI", 2) => Ok(SampleFormat::I16),
            ("FP", 4) => Ok(SampleFormat::F32),
            _ => Err(Error::Protocol(format!(
                "unsupported curve format {bn_fmt} with {point_size} byte points"
            ))),
        }
    }
}

/// Everything `:wfmoutpre?` says about the curve that follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveLayout {
    /// Sample encoding.
    pub format: SampleFormat,
    /// Whether multi-byte samples are little-endian.
    pub little_endian: bool,
    /// Number of points in the record.
    pub points: usize,
    /// Horizontal scaling.
    pub preamble: WaveformPreamble,
    /// Vertical scaling; identity for floating point curves.
    pub vertical: VerticalScale,
}

/// Parse a `:wfmoutpre?` reply.
pub fn parse_wfmoutpre(reply: &str) -> Result<CurveLayout> {
    let fields: Vec<&str> = reply.trim().split(';').map(|f| f.trim().trim_matches('"')).collect();
    if fields.len() < 16 {
        return Err(Error::Protocol(format!(
            "wfmoutpre has {} fields, expected at least 16",
            fields.len()
        )));
    }
    let upper = |i: usize| fields[i].to_ascii_uppercase();

    if upper(7) != "Y" {
        return Err(Error::Protocol(format!("point format {} is not Y", fields[7])));
    }
    if upper(2) != "BINARY" {
        return Err(Error::Protocol(format!("encoding {} is not BINARY", fields[2])));
    }
    let format = SampleFormat::from_fields(&upper(3), parse_scpi_int(fields[0])?)?;
    let little_endian = match upper(4).as_str() {
        "LSB" => true,
        "MSB" => false,
        other => return Err(Error::Protocol(format!("byte order {other}"))),
    };
    let points = usize::try_from(parse_scpi_int(fields[6])?)
        .map_err(|_| Error::Protocol(format!("point count {}", fields[6])))?;

    let preamble = WaveformPreamble {
        x_increment: parse_scpi_float(fields[9])?,
        x_origin: parse_scpi_float(fields[10])?,
        x_reference: parse_scpi_float(fields[11])? as i64,
    };
    let vertical = if format == SampleFormat::F32 {
        VerticalScale::default()
    } else {
        VerticalScale {
            y_multiplier: parse_scpi_float(fields[13])?,
            y_offset: parse_scpi_float(fields[14])?.trunc(),
            y_zero: parse_scpi_float(fields[15])?,
        }
    };
    Ok(CurveLayout {
        format,
        little_endian,
        points,
        preamble,
        vertical,
    })
}

/// Decode at most `layout.points` samples from a curve block.
///
/// A trailing partial sample is ignored.
pub fn decode_curve(layout: &CurveLayout, block: &[u8]) -> Vec<f64> {
    let width = layout.format.width();
    let count = layout.points.min(block.len() / width);
    let mut buf = &block[..count * width];
    let le = layout.little_endian;
    let mut raw = Vec::with_capacity(count);
    while buf.has_remaining() {
        let v = match layout.format {
            SampleFormat::U8 => f64::from(buf.get_u8()),
            SampleFormat::I8 => f64::from(buf.get_i8()),
            SampleFormat::U16 if le => f64::from(buf.get_u16_le()),
            SampleFormat::U16 => f64::from(buf.get_u16()),
            SampleFormat::I16 if le => f64::from(buf.get_i16_le()),
            SampleFormat::I16 => f64::from(buf.get_i16()),
            SampleFormat::F32 if le => f64::from(buf.get_f32_le()),
            SampleFormat::F32 => f64::from(buf.get_f32()),
        };
        raw.push(v);
    }
    raw
}
