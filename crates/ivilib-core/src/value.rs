//! Attribute values, value kinds and write constraints.

use std::fmt;

use crate::error::{Error, Result};

/// The kind of value an attribute stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `true` / `false`, sent as `1` / `0`.
    Bool,
    /// Floating point, sent in `%e` notation.
    Float,
    /// Integer, sent in decimal.
    Int,
    /// Enumerated neutral symbol, translated to a device token.
    Symbol,
    /// Free text, sent verbatim.
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Bool => "bool",
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Symbol => "symbol",
            ValueKind::Text => "text",
        };
        write!(f, "{s}")
    }
}

/// One cached or written attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Boolean state.
    Bool(bool),
    /// Floating point quantity.
    Float(f64),
    /// Integer quantity.
    Int(i64),
    /// Neutral enumeration symbol.
    Symbol(String),
    /// Free text.
    Text(String),
}

impl AttributeValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Bool(_) => ValueKind::Bool,
            AttributeValue::Float(_) => ValueKind::Float,
            AttributeValue::Int(_) => ValueKind::Int,
            AttributeValue::Symbol(_) => ValueKind::Symbol,
            AttributeValue::Text(_) => ValueKind::Text,
        }
    }

    /// Convert to the given kind where the conversion is lossless.
    ///
    /// Ints widen to floats, integral floats narrow to ints, and text and
    /// symbols are interchangeable. Everything else is a mismatch.
    pub fn coerce(self, kind: ValueKind, attribute: &str) -> Result<AttributeValue> {
        let mismatch = || Error::TypeMismatch {
            attribute: attribute.to_string(),
            expected: kind.to_string(),
        };
        match (self, kind) {
            (v, k) if v.kind() == k => Ok(v),
            (AttributeValue::Int(i), ValueKind::Float) => Ok(AttributeValue::Float(i as f64)),
            (AttributeValue::Float(f), ValueKind::Int) if f.fract() == 0.0 => {
                Ok(AttributeValue::Int(f as i64))
            }
            (AttributeValue::Text(s), ValueKind::Symbol) => Ok(AttributeValue::Symbol(s)),
            (AttributeValue::Symbol(s), ValueKind::Text) => Ok(AttributeValue::Text(s)),
            _ => Err(mismatch()),
        }
    }

    /// Numeric view used by range checks.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow as a boolean.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(other.wrong_kind(ValueKind::Bool)),
        }
    }

    /// Borrow as a float (ints widen).
    pub fn as_f64(&self) -> Result<f64> {
        self.as_number()
            .ok_or_else(|| self.wrong_kind(ValueKind::Float))
    }

    /// Borrow as an integer.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            AttributeValue::Int(i) => Ok(*i),
            other => Err(other.wrong_kind(ValueKind::Int)),
        }
    }

    /// Borrow as a symbol or text.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            AttributeValue::Symbol(s) | AttributeValue::Text(s) => Ok(s),
            other => Err(other.wrong_kind(ValueKind::Symbol)),
        }
    }

    /// Parse a user-entered string into a value of `kind`.
    ///
    /// Used by command-line front ends; drivers take typed values.
    pub fn parse(input: &str, kind: ValueKind) -> Result<AttributeValue> {
        let bad = || Error::InvalidParameter(format!("cannot parse {input:?} as {kind}"));
        match kind {
            ValueKind::Bool => match input.to_ascii_lowercase().as_str() {
                "1" | "on" | "true" => Ok(AttributeValue::Bool(true)),
                "0" | "off" | "false" => Ok(AttributeValue::Bool(false)),
                _ => Err(bad()),
            },
            ValueKind::Float => input.parse().map(AttributeValue::Float).map_err(|_| bad()),
            ValueKind::Int => input.parse().map(AttributeValue::Int).map_err(|_| bad()),
            ValueKind::Symbol => Ok(AttributeValue::Symbol(input.to_string())),
            ValueKind::Text => Ok(AttributeValue::Text(input.to_string())),
        }
    }

    fn wrong_kind(&self, expected: ValueKind) -> Error {
        Error::TypeMismatch {
            attribute: format!("{self} ({})", self.kind()),
            expected: expected.to_string(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Symbol(s) | AttributeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Symbol(v.to_string())
    }
}

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    /// Boundary value.
    pub value: f64,
    /// Whether the boundary itself is accepted.
    pub inclusive: bool,
}

impl Limit {
    /// An inclusive boundary.
    pub const fn inclusive(value: f64) -> Self {
        Limit {
            value,
            inclusive: true,
        }
    }

    /// An exclusive boundary.
    pub const fn exclusive(value: f64) -> Self {
        Limit {
            value,
            inclusive: false,
        }
    }
}

/// Validation applied to every write, independent of cache state.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// No validation.
    Unconstrained,
    /// Numeric bounds.
    Range {
        /// Lower bound.
        min: Limit,
        /// Upper bound.
        max: Limit,
    },
    /// The value must be one of these symbols.
    OneOf(Vec<&'static str>),
}

impl Constraint {
    /// Closed range `[min, max]`.
    pub const fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Limit::inclusive(min),
            max: Limit::inclusive(max),
        }
    }

    /// Check `value` for `attribute`.
    ///
    /// NaN never satisfies a range.
    pub fn check(&self, attribute: &str, value: &AttributeValue) -> Result<()> {
        match self {
            Constraint::Unconstrained => Ok(()),
            Constraint::Range { min, max } => {
                let v = value.as_number().ok_or_else(|| Error::TypeMismatch {
                    attribute: attribute.to_string(),
                    expected: ValueKind::Float.to_string(),
                })?;
                let above_min = if min.inclusive {
                    v >= min.value
                } else {
                    v > min.value
                };
                let below_max = if max.inclusive {
                    v <= max.value
                } else {
                    v < max.value
                };
                if above_min && below_max {
                    Ok(())
                } else {
                    Err(Error::OutOfRange {
                        attribute: attribute.to_string(),
                        value: v,
                        min: min.value,
                        max: max.value,
                    })
                }
            }
            Constraint::OneOf(symbols) => {
                let s = value.as_str().map_err(|_| Error::TypeMismatch {
                    attribute: attribute.to_string(),
                    expected: ValueKind::Symbol.to_string(),
                })?;
                if symbols.contains(&s) {
                    Ok(())
                } else {
                    Err(Error::UnsupportedValue {
                        attribute: attribute.to_string(),
                        value: s.to_string(),
                    })
                }
            }
        }
    }
}
