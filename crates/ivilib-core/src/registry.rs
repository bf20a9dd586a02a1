//! The indexed attribute registry.
//!
//! Holds the immutable attribute table and, for every attribute, one value
//! slot and one cache-validity flag per index of its domain. Slots are
//! sized once from the domain and never resized.

use std::collections::HashMap;

use crate::attribute::{AttributeSpec, SCALAR_DOMAIN};
use crate::error::{Error, Result};
use crate::index::{Index, IndexDomain};
use crate::value::AttributeValue;

#[derive(Debug)]
struct Slots {
    values: Vec<AttributeValue>,
    valid: Vec<bool>,
}

/// Attribute table plus per-index cache state.
#[derive(Debug)]
pub struct AttributeRegistry {
    domains: Vec<IndexDomain>,
    specs: Vec<AttributeSpec>,
    /// Position of each spec's domain in `domains`.
    spec_domain: Vec<usize>,
    lookup: HashMap<&'static str, usize>,
    slots: Vec<Slots>,
}

impl AttributeRegistry {
    /// Build a registry from the driver's domains and attribute table.
    ///
    /// A scalar domain is added when none of `domains` has its kind. Fails
    /// with [`Error::InvalidTable`] on duplicate attribute names, unknown
    /// domains, defaults of the wrong kind, defaults violating their own
    /// constraint, or templates without a `{value}` placeholder.
    pub fn new(mut domains: Vec<IndexDomain>, specs: Vec<AttributeSpec>) -> Result<Self> {
        if !domains.iter().any(|d| d.kind() == SCALAR_DOMAIN) {
            domains.push(IndexDomain::scalar());
        }
        for (i, d) in domains.iter().enumerate() {
            if domains[..i].iter().any(|o| o.kind() == d.kind()) {
                return Err(Error::InvalidTable(format!(
                    "domain {} declared twice",
                    d.kind()
                )));
            }
        }

        let mut lookup = HashMap::with_capacity(specs.len());
        let mut spec_domain = Vec::with_capacity(specs.len());
        let mut slots = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if lookup.insert(spec.name, i).is_some() {
                return Err(Error::InvalidTable(format!(
                    "attribute {} declared twice",
                    spec.name
                )));
            }
            let d = domains
                .iter()
                .position(|d| d.kind() == spec.domain)
                .ok_or_else(|| {
                    Error::InvalidTable(format!(
                        "attribute {} spans unknown domain {}",
                        spec.name, spec.domain
                    ))
                })?;
            check_spec(spec)?;
            let n = domains[d].len();
            spec_domain.push(d);
            slots.push(Slots {
                values: vec![spec.default.clone(); n],
                valid: vec![false; n],
            });
        }

        Ok(AttributeRegistry {
            domains,
            specs,
            spec_domain,
            lookup,
            slots,
        })
    }

    /// Position of the attribute called `name`.
    pub fn find(&self, name: &str) -> Result<usize> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    /// Spec at a position returned by [`find`](Self::find).
    pub fn spec(&self, attr: usize) -> &AttributeSpec {
        &self.specs[attr]
    }

    /// Domain spanned by an attribute.
    pub fn domain_of(&self, attr: usize) -> &IndexDomain {
        &self.domains[self.spec_domain[attr]]
    }

    /// Domain with the given kind.
    pub fn domain(&self, kind: &str) -> Result<&IndexDomain> {
        self.domains
            .iter()
            .find(|d| d.kind() == kind)
            .ok_or_else(|| Error::InvalidParameter(format!("no {kind} domain")))
    }

    /// Resolve `index` against the domain of `attr`.
    pub fn resolve(&self, attr: usize, index: &Index) -> Result<usize> {
        self.domain_of(attr).resolve(index)
    }

    /// All attribute specs in table order.
    pub fn specs(&self) -> &[AttributeSpec] {
        &self.specs
    }

    /// Current slot value, valid or not.
    pub fn value(&self, attr: usize, index: usize) -> &AttributeValue {
        &self.slots[attr].values[index]
    }

    /// Whether the slot reflects the device.
    pub fn is_valid(&self, attr: usize, index: usize) -> bool {
        self.slots[attr].valid[index]
    }

    /// Store a value and mark the slot valid.
    pub fn store(&mut self, attr: usize, index: usize, value: AttributeValue) {
        let slots = &mut self.slots[attr];
        slots.values[index] = value;
        slots.valid[index] = true;
    }

    /// Mark one slot stale, keeping its last value.
    pub fn invalidate(&mut self, attr: usize, index: usize) {
        self.slots[attr].valid[index] = false;
    }

    /// Mark every slot of every attribute stale.
    pub fn invalidate_all(&mut self) {
        for slots in &mut self.slots {
            slots.valid.iter_mut().for_each(|v| *v = false);
        }
    }
}

fn check_spec(spec: &AttributeSpec) -> Result<()> {
    if spec.default.kind() != spec.kind {
        return Err(Error::InvalidTable(format!(
            "attribute {}: default {} is not a {}",
            spec.name, spec.default, spec.kind
        )));
    }
    spec.constraint
        .check(spec.name, &spec.default)
        .map_err(|e| Error::InvalidTable(format!("attribute {}: default rejected: {e}", spec.name)))?;
    if let crate::attribute::Access::Scpi { command, .. } = &spec.access {
        if !command.contains("{value}") {
            return Err(Error::InvalidTable(format!(
                "attribute {}: command template {command:?} has no {{value}}",
                spec.name
            )));
        }
    }
    Ok(())
}
