//! Formatting and parsing helpers for SCPI-style command strings.
//!
//! Instrument firmware expects numeric parameters in C `%e` notation and
//! replies with loosely formatted ASCII numbers. These helpers keep both
//! directions consistent across every driver.

use crate::error::{Error, Result};

/// Format a float the way C's `printf("%e")` does.
///
/// Six digits after the decimal point, an explicit exponent sign and at
/// least two exponent digits.
///
/// # Example
///
/// ```
/// use ivilib_core::format_scientific;
///
/// assert_eq!(format_scientific(50e6), "5.000000e+07");
/// assert_eq!(format_scientific(0.01), "1.000000e-02");
/// assert_eq!(format_scientific(-180.0), "-1.800000e+02");
/// ```
pub fn format_scientific(value: f64) -> String {
    let s = format!("{value:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Parse a numeric reply such as `"1.000000E+03"` or `" 50\n"`.
pub fn parse_scpi_float(reply: &str) -> Result<f64> {
    let trimmed = reply.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::Protocol(format!("expected a number, got {trimmed:?}")))
}

/// Parse an integer reply, accepting integral values in float notation
/// (`"1000"`, `"1.0E+3"`).
pub fn parse_scpi_int(reply: &str) -> Result<i64> {
    let trimmed = reply.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    let f = parse_scpi_float(trimmed)?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(Error::Protocol(format!(
            "expected an integer, got {trimmed:?}"
        )))
    }
}

/// Parse a boolean reply (`0`/`1`, `ON`/`OFF`, `TRUE`/`FALSE`).
///
/// Any other integer is treated as `true` when non-zero.
pub fn parse_scpi_bool(reply: &str) -> Result<bool> {
    let trimmed = reply.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "1" | "ON" | "TRUE" => Ok(true),
        "0" | "OFF" | "FALSE" => Ok(false),
        _ => parse_scpi_int(trimmed)
            .map(|v| v != 0)
            .map_err(|_| Error::Protocol(format!("expected a boolean, got {trimmed:?}"))),
    }
}
