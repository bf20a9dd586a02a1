//! Static attribute descriptions.
//!
//! Every driver describes its attribute surface as a `Vec<AttributeSpec>`
//! built once at construction time. A spec names the attribute, the index
//! domain it spans, its value kind and default, the validation applied to
//! writes, an optional enumeration translator, and how the value reaches
//! the device ([`Access`]).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::{Error, Result};
use crate::index::IndexDomain;
use crate::session::Session;
use crate::translate::ValueTranslator;
use crate::value::{AttributeValue, Constraint, ValueKind};

/// Boxed future returned by custom attribute accessors.
pub type AttributeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Custom read: query the device for slot `index` and return the value.
///
/// The session stores the result and marks the slot valid.
pub type ReadFn = for<'a> fn(&'a mut Session, usize) -> AttributeFuture<'a, AttributeValue>;

/// Custom write or coupling hook for slot `index`.
pub type WriteFn =
    for<'a> fn(&'a mut Session, usize, AttributeValue) -> AttributeFuture<'a, ()>;

/// Name of the single-slot domain used by instrument-wide attributes.
pub const SCALAR_DOMAIN: &str = "instrument";

/// How an attribute's value travels to and from the device.
#[derive(Clone)]
pub enum Access {
    /// The value lives in the cache only; reads and writes never do I/O.
    Cached,
    /// Plain SCPI query and command templates.
    ///
    /// `{value}` is replaced by the formatted value; any other `{name}` is
    /// replaced by the index's device header for subsystem `name`.
    Scpi {
        /// Query template, e.g. `":{source}:frequency?"`.
        query: &'static str,
        /// Command template, e.g. `":{source}:frequency {value}"`.
        command: &'static str,
    },
    /// Driver-supplied accessors for attributes that do not map onto a
    /// single query/command pair.
    Custom {
        /// Device read.
        read: ReadFn,
        /// Device write, only invoked when not simulating.
        write: WriteFn,
    },
}

impl fmt::Debug for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Cached => write!(f, "Cached"),
            Access::Scpi { query, command } => f
                .debug_struct("Scpi")
                .field("query", query)
                .field("command", command)
                .finish(),
            Access::Custom { .. } => write!(f, "Custom"),
        }
    }
}

/// One entry of a driver's attribute table.
#[derive(Clone)]
pub struct AttributeSpec {
    /// Stable dotted name, e.g. `output.standard_waveform.amplitude`.
    pub name: &'static str,
    /// Kind of the index domain this attribute spans.
    pub domain: &'static str,
    /// Kind of value stored.
    pub kind: ValueKind,
    /// Value every slot holds before the first read or write.
    pub default: AttributeValue,
    /// Validation applied to writes.
    pub constraint: Constraint,
    /// Symbol <-> device token mapping for enumerated attributes.
    pub translator: Option<ValueTranslator>,
    /// Device access.
    pub access: Access,
    /// Side effect run after every successful write, simulating or not,
    /// once the primary value is stored.
    pub coupling: Option<WriteFn>,
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("constraint", &self.constraint)
            .field("access", &self.access)
            .field("coupled", &self.coupling.is_some())
            .finish()
    }
}

impl AttributeSpec {
    /// A cached, unconstrained, instrument-wide attribute whose kind is
    /// taken from `default`.
    pub fn new(name: &'static str, default: impl Into<AttributeValue>) -> Self {
        let default = default.into();
        AttributeSpec {
            name,
            domain: SCALAR_DOMAIN,
            kind: default.kind(),
            default,
            constraint: Constraint::Unconstrained,
            translator: None,
            access: Access::Cached,
            coupling: None,
        }
    }

    /// Span the domain with the given kind instead of the scalar one.
    pub fn over(mut self, domain: &'static str) -> Self {
        self.domain = domain;
        self
    }

    /// Closed numeric range `[min, max]`.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraint = Constraint::range(min, max);
        self
    }

    /// Arbitrary constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Translate symbols through `translator`.
    pub fn translated(mut self, translator: ValueTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// SCPI query/command templates.
    pub fn scpi(mut self, query: &'static str, command: &'static str) -> Self {
        self.access = Access::Scpi { query, command };
        self
    }

    /// Custom device accessors.
    pub fn custom(mut self, read: ReadFn, write: WriteFn) -> Self {
        self.access = Access::Custom { read, write };
        self
    }

    /// Run `hook` after every successful write.
    pub fn coupled(mut self, hook: WriteFn) -> Self {
        self.coupling = Some(hook);
        self
    }

    /// Check a value the caller wants to write.
    ///
    /// Coerces to the attribute's kind, then applies the constraint. An
    /// unconstrained symbol with a translator must be part of the
    /// translator's vocabulary.
    pub fn validate(&self, value: AttributeValue) -> Result<AttributeValue> {
        let value = value.coerce(self.kind, self.name)?;
        self.constraint.check(self.name, &value)?;
        if let (Constraint::Unconstrained, Some(t), AttributeValue::Symbol(s)) =
            (&self.constraint, &self.translator, &value)
        {
            if !t.contains(s) {
                return Err(Error::UnsupportedValue {
                    attribute: self.name.to_string(),
                    value: s.clone(),
                });
            }
        }
        Ok(value)
    }

    /// Format a validated value for the wire.
    pub fn format(&self, value: &AttributeValue) -> Result<String> {
        Ok(match value {
            AttributeValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
            AttributeValue::Float(f) => crate::helpers::format_scientific(*f),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::Symbol(s) => match &self.translator {
                Some(t) => t.to_device(s)?.to_string(),
                None => s.clone(),
            },
            AttributeValue::Text(s) => s.clone(),
        })
    }

    /// Parse a device reply into a value of this attribute's kind.
    pub fn parse(&self, reply: &str) -> Result<AttributeValue> {
        let reply = reply.trim();
        Ok(match self.kind {
            ValueKind::Bool => AttributeValue::Bool(crate::helpers::parse_scpi_bool(reply)?),
            ValueKind::Float => AttributeValue::Float(crate::helpers::parse_scpi_float(reply)?),
            ValueKind::Int => AttributeValue::Int(crate::helpers::parse_scpi_int(reply)?),
            ValueKind::Symbol => AttributeValue::Symbol(match &self.translator {
                Some(t) => t.from_device(reply)?.to_string(),
                None => reply.to_string(),
            }),
            ValueKind::Text => AttributeValue::Text(reply.to_string()),
        })
    }
}

/// Expand a command template for slot `index` of `domain`.
pub fn render(template: &str, domain: &IndexDomain, index: usize, value: Option<&str>) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        match &after[..end] {
            "value" => out.push_str(value.unwrap_or_default()),
            subsystem => out.push_str(domain.header(subsystem, index)),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> IndexDomain {
        IndexDomain::new("outputs", IndexDomain::numbered_names("output", 2))
            .unwrap()
            .with_headers("source", IndexDomain::numbered_names("source", 2))
            .unwrap()
    }

    #[test]
    fn render_substitutes_headers_and_value() {
        let d = outputs();
        assert_eq!(
            render(":{source}:frequency {value}", &d, 1, Some("1.000000e+03")),
            ":source2:frequency 1.000000e+03"
        );
        assert_eq!(render(":{output}?", &d, 0, None), ":output1?");
        assert_eq!(render(":{output}:impedance?", &d, 1, None), ":output2:impedance?");
    }

    #[test]
    fn render_leaves_unterminated_brace() {
        let d = outputs();
        assert_eq!(render(":{source", &d, 0, None), ":{source");
    }

    #[test]
    fn validate_applies_range_after_coercion() {
        let spec = AttributeSpec::new("amplitude", 1.0).range(0.01, 5.0);
        assert_eq!(
            spec.validate(AttributeValue::Int(2)).unwrap(),
            AttributeValue::Float(2.0)
        );
        assert!(matches!(
            spec.validate(0.005.into()),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn validate_checks_translator_vocabulary() {
        let t = ValueTranslator::new("impedance", &[("HighZ", "OMEG"), ("50Ohms", "FIFTY")])
            .unwrap();
        let spec = AttributeSpec::new("impedance", "50Ohms").translated(t);
        assert!(spec.validate("HighZ".into()).is_ok());
        assert!(matches!(
            spec.validate("75Ohms".into()),
            Err(Error::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn format_and_parse_by_kind() {
        let b = AttributeSpec::new("enabled", false);
        assert_eq!(b.format(&true.into()).unwrap(), "1");
        assert_eq!(b.parse("0\n").unwrap(), AttributeValue::Bool(false));

        let f = AttributeSpec::new("frequency", 1000.0);
        assert_eq!(f.format(&50e6.into()).unwrap(), "5.000000e+07");
        assert_eq!(f.parse("1.000000E+03").unwrap(), AttributeValue::Float(1000.0));

        let i = AttributeSpec::new("record_length", 1000i64);
        assert_eq!(i.format(&AttributeValue::Int(5000)).unwrap(), "5000");
        assert_eq!(i.parse("1.0E+3").unwrap(), AttributeValue::Int(1000));
    }

    #[test]
    fn symbols_translate_both_ways() {
        let t = ValueTranslator::new("impedance", &[("HighZ", "OMEG"), ("50Ohms", "FIFTY")])
            .unwrap()
            .with_alias("FIFT", "50Ohms")
            .unwrap();
        let spec = AttributeSpec::new("impedance", "50Ohms").translated(t);
        assert_eq!(spec.format(&"HighZ".into()).unwrap(), "OMEG");
        assert_eq!(spec.parse("FIFT").unwrap(), AttributeValue::Symbol("50Ohms".into()));
    }
}
