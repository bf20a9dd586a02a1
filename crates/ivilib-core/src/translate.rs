//! Bidirectional mapping between instrument-neutral symbols and the tokens
//! a particular firmware expects.
//!
//! A [`ValueTranslator`] is built once, when a driver assembles its
//! attribute table, and never changes. Construction checks that the table
//! is injective (no two symbols share a device token), so the inverse map
//! can be precomputed and every later lookup is a plain hash probe.
//!
//! Firmware sometimes reports tokens the neutral vocabulary does not model
//! (a generator in arbitrary mode answers `ARB` when asked for its standard
//! waveform). Such tokens are registered as read-back aliases: they
//! translate to an existing symbol on the way in, but are never produced on
//! the way out.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Stateless, precomputed symbol <-> token lookup for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTranslator {
    name: String,
    forward: Vec<(String, String)>,
    /// Upper-cased device token -> position in `forward`.
    reverse: HashMap<String, usize>,
    /// Upper-cased alias token -> position in `forward`.
    aliases: HashMap<String, usize>,
}

impl ValueTranslator {
    /// Build a translator from `(symbol, token)` pairs.
    ///
    /// Fails with [`Error::InvalidTable`] when the table is empty, repeats a
    /// symbol, or maps two symbols to the same token (tokens compare ASCII
    /// case-insensitively, as firmware replies do).
    pub fn new(name: &str, pairs: &[(&str, &str)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(Error::InvalidTable(format!("{name}: empty mapping")));
        }
        let mut forward: Vec<(String, String)> = Vec::with_capacity(pairs.len());
        let mut reverse: HashMap<String, usize> = HashMap::with_capacity(pairs.len());
        for (symbol, token) in pairs {
            if forward.iter().any(|(s, _)| s == symbol) {
                return Err(Error::InvalidTable(format!(
                    "{name}: symbol {symbol:?} mapped twice"
                )));
            }
            let key = token.to_ascii_uppercase();
            if let Some(&prev) = reverse.get(&key) {
                let other = &forward[prev].0;
                return Err(Error::InvalidTable(format!(
                    "{name}: symbols {other:?} and {symbol:?} share device token {token:?}"
                )));
            }
            reverse.insert(key, forward.len());
            forward.push((symbol.to_string(), token.to_string()));
        }
        Ok(ValueTranslator {
            name: name.to_string(),
            forward,
            reverse,
            aliases: HashMap::new(),
        })
    }

    /// Identity mapping, for attributes whose device tokens are the
    /// symbols themselves.
    pub fn identity(name: &str, symbols: &[&str]) -> Result<Self> {
        let pairs: Vec<(&str, &str)> = symbols.iter().map(|s| (*s, *s)).collect();
        Self::new(name, &pairs)
    }

    /// Register a read-back alias: `token` reads as `symbol` but `symbol`
    /// still writes as its primary token.
    pub fn with_alias(mut self, token: &str, symbol: &str) -> Result<Self> {
        let pos = self
            .forward
            .iter()
            .position(|(s, _)| s == symbol)
            .ok_or_else(|| {
                Error::InvalidTable(format!(
                    "{}: alias {token:?} targets unknown symbol {symbol:?}",
                    self.name
                ))
            })?;
        let key = token.to_ascii_uppercase();
        if self.reverse.contains_key(&key) || self.aliases.contains_key(&key) {
            return Err(Error::InvalidTable(format!(
                "{}: alias {token:?} collides with an existing token",
                self.name
            )));
        }
        self.aliases.insert(key, pos);
        Ok(self)
    }

    /// Name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Neutral symbol -> device token.
    pub fn to_device(&self, symbol: &str) -> Result<&str> {
        self.forward
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, t)| t.as_str())
            .ok_or_else(|| Error::UnsupportedValue {
                attribute: self.name.clone(),
                value: symbol.to_string(),
            })
    }

    /// Device token -> neutral symbol, honouring read-back aliases.
    pub fn from_device(&self, token: &str) -> Result<&str> {
        let key = token.trim().to_ascii_uppercase();
        self.reverse
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .map(|&pos| self.forward[pos].0.as_str())
            .ok_or_else(|| Error::UnsupportedValue {
                attribute: self.name.clone(),
                value: token.trim().to_string(),
            })
    }

    /// Whether `symbol` is part of the neutral vocabulary.
    pub fn contains(&self, symbol: &str) -> bool {
        self.forward.iter().any(|(s, _)| s == symbol)
    }

    /// Whether `token` reads back through an alias rather than a primary
    /// mapping.
    pub fn is_alias(&self, token: &str) -> bool {
        let key = token.trim().to_ascii_uppercase();
        !self.reverse.contains_key(&key) && self.aliases.contains_key(&key)
    }

    /// Neutral symbols in table order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.forward.iter().map(|(s, _)| s.as_str())
    }

    /// Primary device tokens in table order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.forward.iter().map(|(_, t)| t.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impedance() -> ValueTranslator {
        ValueTranslator::new("output.impedance", &[("HighZ", "OMEG"), ("50Ohms", "FIFTY")])
            .unwrap()
            .with_alias("FIFT", "50Ohms")
            .unwrap()
    }

    #[test]
    fn forward_and_reverse() {
        let t = impedance();
        assert_eq!(t.to_device("HighZ").unwrap(), "OMEG");
        assert_eq!(t.from_device("OMEG").unwrap(), "HighZ");
        assert_eq!(t.from_device("fifty\n").unwrap(), "50Ohms");
    }

    #[test]
    fn alias_reads_but_never_writes() {
        let t = impedance();
        assert_eq!(t.from_device("FIFT").unwrap(), "50Ohms");
        assert!(t.is_alias("FIFT"));
        assert_eq!(t.to_device("50Ohms").unwrap(), "FIFTY");
    }

    #[test]
    fn round_trip_for_primary_tokens() {
        let t = impedance();
        for token in t.tokens() {
            assert_eq!(t.to_device(t.from_device(token).unwrap()).unwrap(), token);
        }
    }

    #[test]
    fn unknown_values_are_unsupported() {
        let t = impedance();
        assert!(matches!(
            t.to_device("75Ohms"),
            Err(Error::UnsupportedValue { .. })
        ));
        assert!(matches!(
            t.from_device("XYZ"),
            Err(Error::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn non_injective_table_fails_fast() {
        let err = ValueTranslator::new("shape", &[("triangle", "RAMP"), ("ramp_up", "ramp")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn duplicate_symbol_fails_fast() {
        let err = ValueTranslator::new("shape", &[("sine", "SIN"), ("sine", "SINE")]).unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn alias_must_target_known_symbol_and_not_collide() {
        assert!(impedance().with_alias("HIGH", "75Ohms").is_err());
        assert!(impedance().with_alias("omeg", "50Ohms").is_err());
    }

    #[test]
    fn identity_mapping() {
        let t = ValueTranslator::identity("output.mode", &["function", "arbitrary"]).unwrap();
        assert_eq!(t.to_device("arbitrary").unwrap(), "arbitrary");
        assert_eq!(t.from_device("FUNCTION").unwrap(), "function");
    }
}
