//! Index domains: the fixed set of channels or outputs an attribute spans.
//!
//! A driver builds one [`IndexDomain`] per repeated capability (outputs,
//! channels) when it is constructed, sized from the instrument model's
//! channel/output count. The domain never changes afterwards. Callers
//! address an index either by its canonical name or by its zero-based
//! ordinal, see [`Index`].
//!
//! Besides the canonical names a domain can carry per-subsystem device
//! headers. A Rigol generator's outputs are called `output1`/`output2`, but
//! waveform settings live under `source1`/`source2`; both header sets are
//! kept side by side so command templates can pick the right one.

use std::fmt;

use crate::error::{Error, Result};

/// A caller-supplied reference to one member of an [`IndexDomain`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    /// Canonical name, e.g. `"output1"` or `"channel2"`.
    Name(String),
    /// Zero-based position in the domain.
    Ordinal(usize),
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Name(name) => write!(f, "{name:?}"),
            Index::Ordinal(n) => write!(f, "#{n}"),
        }
    }
}

impl From<&str> for Index {
    fn from(name: &str) -> Self {
        Index::Name(name.to_string())
    }
}

impl From<String> for Index {
    fn from(name: String) -> Self {
        Index::Name(name)
    }
}

impl From<&String> for Index {
    fn from(name: &String) -> Self {
        Index::Name(name.clone())
    }
}

impl From<usize> for Index {
    fn from(ordinal: usize) -> Self {
        Index::Ordinal(ordinal)
    }
}

/// Ordered, immutable set of valid indices for a repeated capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDomain {
    kind: &'static str,
    names: Vec<String>,
    headers: Vec<(&'static str, Vec<String>)>,
}

impl IndexDomain {
    /// Create a domain from its canonical names.
    ///
    /// `kind` is a plural label used in error messages (`"outputs"`).
    pub fn new(kind: &'static str, names: Vec<String>) -> Result<Self> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
                return Err(Error::InvalidTable(format!(
                    "duplicate index name {name:?} in {kind}"
                )));
            }
        }
        Ok(IndexDomain {
            kind,
            names,
            headers: Vec::new(),
        })
    }

    /// Single-slot domain for instrument-wide attributes.
    pub fn scalar() -> Self {
        IndexDomain {
            kind: "instrument",
            names: vec![String::new()],
            headers: Vec::new(),
        }
    }

    /// Build the usual `<prefix>1..<prefix>N` naming, collapsing to the
    /// bare prefix when `count == 1`.
    pub fn numbered_names(prefix: &str, count: usize) -> Vec<String> {
        if count == 1 {
            vec![prefix.to_string()]
        } else {
            (1..=count).map(|i| format!("{prefix}{i}")).collect()
        }
    }

    /// Attach device headers for a subsystem, one per index.
    pub fn with_headers(mut self, subsystem: &'static str, headers: Vec<String>) -> Result<Self> {
        if headers.len() != self.names.len() {
            return Err(Error::InvalidTable(format!(
                "{} headers for {subsystem} but {} {}",
                headers.len(),
                self.names.len(),
                self.kind
            )));
        }
        self.headers.retain(|(s, _)| *s != subsystem);
        self.headers.push((subsystem, headers));
        Ok(self)
    }

    /// Plural label of this domain.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the domain has no indices at all.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Canonical name of a resolved index.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Device header of a resolved index for `subsystem`, falling back to
    /// the canonical name when the subsystem has no headers of its own.
    pub fn header(&self, subsystem: &str, index: usize) -> &str {
        self.headers
            .iter()
            .find(|(s, _)| *s == subsystem)
            .map(|(_, h)| h[index].as_str())
            .unwrap_or_else(|| self.names[index].as_str())
    }

    /// Subsystems that carry their own headers.
    pub fn subsystems(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.headers.iter().map(|(s, _)| *s)
    }

    /// Resolve a caller-supplied index to its position.
    ///
    /// Names match exactly first, then ASCII case-insensitively.
    pub fn resolve(&self, index: &Index) -> Result<usize> {
        let found = match index {
            Index::Ordinal(n) => (*n < self.names.len()).then_some(*n),
            Index::Name(name) => self
                .names
                .iter()
                .position(|n| n == name)
                .or_else(|| self.names.iter().position(|n| n.eq_ignore_ascii_case(name))),
        };
        found.ok_or_else(|| Error::IndexResolution {
            index: index.to_string(),
            domain: format!("{} [{}]", self.kind, self.names.join(", ")),
        })
    }
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
    fn numbered_names_collapse_for_single() {
        assert_eq!(IndexDomain::numbered_names("output", 1), vec!["output"]);
        assert_eq!(
            IndexDomain::numbered_names("output", 3),
            vec!["output1", "output2", "output3"]
        );
    }

    #[test]
    fn resolve_by_name_and_ordinal() {
        let d = outputs();
        assert_eq!(d.resolve(&"output2".into()).unwrap(), 1);
        assert_eq!(d.resolve(&"OUTPUT1".into()).unwrap(), 0);
        assert_eq!(d.resolve(&0usize.into()).unwrap(), 0);
    }

    #[test]
    fn resolve_failure_is_index_resolution_error() {
        let d = outputs();
        let err = d.resolve(&"output3".into()).unwrap_err();
        assert!(matches!(err, Error::IndexResolution { .. }));
        let err = d.resolve(&2usize.into()).unwrap_err();
        assert!(err.to_string().contains("output1, output2"));
    }

    #[test]
    fn headers_fall_back_to_names() {
        let d = outputs();
        assert_eq!(d.header("source", 1), "source2");
        assert_eq!(d.header("output", 1), "output2");
    }

    #[test]
    fn header_count_must_match() {
        let err = IndexDomain::new("outputs", IndexDomain::numbered_names("output", 2))
            .unwrap()
            .with_headers("source", vec!["source".into()])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = IndexDomain::new("channels", vec!["ch1".into(), "CH1".into()]).unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn scalar_domain_has_one_slot() {
        let d = IndexDomain::scalar();
        assert_eq!(d.len(), 1);
        assert_eq!(d.resolve(&0usize.into()).unwrap(), 0);
    }
}
