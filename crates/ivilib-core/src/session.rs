//! Instrument sessions: the attribute registry bound to device I/O.
//!
//! A [`Session`] owns the I/O handle, the [`AttributeRegistry`] and the
//! constructor-time `simulate` flag, and implements the caching rules:
//!
//! * `get` returns the slot without I/O when simulating or when the slot
//!   is valid; otherwise it performs exactly one read, stores the result
//!   and marks the slot valid.
//! * `set` validates before any I/O, sends the command unless simulating,
//!   then stores the value and marks the slot valid. A failed device write
//!   leaves the slot untouched. When a coupled follow-up write fails, the
//!   primary slot is marked stale again before the error is returned.
//!
//! An [`Instrument`] wraps the session in a `tokio::sync::Mutex` so that a
//! get, a set, or a coupled multi-attribute operation runs start to finish
//! without interleaving with other callers.

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::attribute::{Access, render};
use crate::error::{Error, Result};
use crate::index::{Index, IndexDomain};
use crate::io::InstrumentIo;
use crate::registry::AttributeRegistry;
use crate::types::{Identity, InstrumentInfo};
use crate::value::AttributeValue;

/// Device I/O plus attribute cache for one instrument.
pub struct Session {
    io: Box<dyn InstrumentIo>,
    registry: AttributeRegistry,
    simulate: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("simulate", &self.simulate)
            .field("attributes", &self.registry.specs().len())
            .finish()
    }
}

impl Session {
    /// Bind a registry to an I/O handle.
    pub fn new(io: Box<dyn InstrumentIo>, registry: AttributeRegistry, simulate: bool) -> Self {
        Session {
            io,
            registry,
            simulate,
        }
    }

    /// Whether device I/O is suppressed.
    pub fn simulate(&self) -> bool {
        self.simulate
    }

    /// The attribute table and cache.
    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    /// Domain with the given kind (`"outputs"`, `"channels"`, ...).
    pub fn domain(&self, kind: &str) -> Result<&IndexDomain> {
        self.registry.domain(kind)
    }

    /// Read an attribute, from cache when possible.
    pub async fn get(&mut self, name: &str, index: impl Into<Index>) -> Result<AttributeValue> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        if self.simulate || self.registry.is_valid(attr, slot) {
            trace!(attribute = name, slot, "cache hit");
            return Ok(self.registry.value(attr, slot).clone());
        }

        let spec = self.registry.spec(attr);
        let value = match spec.access.clone() {
            Access::Cached => {
                return Ok(self.registry.value(attr, slot).clone());
            }
            Access::Scpi { query, .. } => {
                let cmd = render(query, self.registry.domain_of(attr), slot, None);
                let reply = self.io.query(&cmd).await?;
                self.registry.spec(attr).parse(&reply)?
            }
            Access::Custom { read, .. } => read(self, slot).await?,
        };
        debug!(attribute = name, slot, %value, "read from device");
        self.registry.store(attr, slot, value.clone());
        Ok(value)
    }

    /// Write an attribute through to the device and the cache.
    pub async fn set(
        &mut self,
        name: &str,
        index: impl Into<Index>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        let spec = self.registry.spec(attr);
        let value = spec.validate(value.into())?;
        let access = spec.access.clone();
        let coupling = spec.coupling;

        if !self.simulate {
            match access {
                Access::Cached => {}
                Access::Scpi { command, .. } => {
                    let formatted = self.registry.spec(attr).format(&value)?;
                    let cmd = render(command, self.registry.domain_of(attr), slot, Some(&formatted));
                    self.io.write(&cmd).await?;
                }
                Access::Custom { write, .. } => write(self, slot, value.clone()).await?,
            }
            debug!(attribute = name, slot, %value, "written to device");
        }
        self.registry.store(attr, slot, value.clone());

        if let Some(hook) = coupling {
            // A failed dependent write leaves the device state unknown.
            if let Err(e) = hook(self, slot, value).await {
                debug!(attribute = name, slot, error = %e, "coupled write failed");
                self.registry.invalidate(attr, slot);
                return Err(e);
            }
        }
        Ok(())
    }

    /// The cached value of a slot, valid or not, without I/O.
    pub fn cached(&self, name: &str, index: impl Into<Index>) -> Result<&AttributeValue> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        Ok(self.registry.value(attr, slot))
    }

    /// Whether a slot currently reflects the device.
    pub fn is_valid(&self, name: &str, index: impl Into<Index>) -> Result<bool> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        Ok(self.registry.is_valid(attr, slot))
    }

    /// Store a value the device has reported (or implicitly adopted) and
    /// mark the slot valid, without I/O.
    ///
    /// Only the value kind is checked; device-reported values are not
    /// range validated.
    pub fn store(
        &mut self,
        name: &str,
        index: impl Into<Index>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        let value = value.into().coerce(self.registry.spec(attr).kind, name)?;
        trace!(attribute = name, slot, %value, "stored");
        self.registry.store(attr, slot, value);
        Ok(())
    }

    /// Mark one slot stale so the next `get` reads the device.
    pub fn invalidate(&mut self, name: &str, index: impl Into<Index>) -> Result<()> {
        let attr = self.registry.find(name)?;
        let slot = self.registry.resolve(attr, &index.into())?;
        self.registry.invalidate(attr, slot);
        Ok(())
    }

    /// Mark every slot stale.
    pub fn invalidate_all(&mut self) {
        self.registry.invalidate_all();
    }

    /// Send a raw command. No-op when simulating.
    pub async fn write(&mut self, command: &str) -> Result<()> {
        if self.simulate {
            return Ok(());
        }
        self.io.write(command).await
    }

    /// Send a raw query. Returns an empty reply when simulating.
    pub async fn query(&mut self, command: &str) -> Result<String> {
        if self.simulate {
            return Ok(String::new());
        }
        self.io.query(command).await
    }

    /// Send a raw binary block query. Returns no bytes when simulating.
    pub async fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>> {
        if self.simulate {
            return Ok(Vec::new());
        }
        self.io.query_binary_block(command).await
    }

    /// Send a query with an unframed reply. Returns no bytes when simulating.
    pub async fn query_raw(&mut self, command: &str) -> Result<Vec<u8>> {
        if self.simulate {
            return Ok(Vec::new());
        }
        self.io.query_raw(command).await
    }
}

/// A driver instance: static model information plus a locked session.
#[derive(Debug)]
pub struct Instrument {
    info: InstrumentInfo,
    simulate: bool,
    session: Mutex<Session>,
}

impl Instrument {
    /// Wrap a session.
    pub fn new(info: InstrumentInfo, session: Session) -> Self {
        Instrument {
            info,
            simulate: session.simulate(),
            session: Mutex::new(session),
        }
    }

    /// Static information about this instrument.
    pub fn info(&self) -> &InstrumentInfo {
        &self.info
    }

    /// Whether device I/O is suppressed.
    pub fn simulate(&self) -> bool {
        self.simulate
    }

    /// Lock the session for a multi-step operation.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    /// Read an attribute.
    pub async fn get(&self, name: &str, index: impl Into<Index>) -> Result<AttributeValue> {
        self.session.lock().await.get(name, index).await
    }

    /// Write an attribute.
    pub async fn set(
        &self,
        name: &str,
        index: impl Into<Index>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        self.session.lock().await.set(name, index, value).await
    }

    /// Names of every attribute in table order.
    pub async fn attribute_names(&self) -> Vec<&'static str> {
        let session = self.session.lock().await;
        session.registry().specs().iter().map(|s| s.name).collect()
    }

    /// Query `*IDN?`.
    ///
    /// In simulate mode a synthetic identity built from the model info is
    /// returned.
    pub async fn identify(&self) -> Result<Identity> {
        let mut session = self.session.lock().await;
        if session.simulate() {
            return Ok(Identity {
                manufacturer: self.info.manufacturer.to_string(),
                model: self.info.model_name.clone(),
                serial_number: "SIMULATED".to_string(),
                firmware_revision: env!("CARGO_PKG_VERSION").to_string(),
            });
        }
        let reply = session.query("*IDN?").await?;
        if reply.trim().is_empty() {
            return Err(Error::Protocol("empty *IDN? reply".into()));
        }
        Ok(Identity::parse(&reply))
    }

    /// Send `*RST` and drop every cached value.
    pub async fn reset(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.write("*RST").await?;
        session.invalidate_all();
        debug!(model = %self.info.model_name, "reset, cache invalidated");
        Ok(())
    }

    /// Send `*CLS`.
    pub async fn clear_status(&self) -> Result<()> {
        self.session.lock().await.write("*CLS").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeFuture, AttributeSpec};
    use crate::translate::ValueTranslator;
    use crate::types::{InstrumentClass, Manufacturer};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    /// Records every exchange and answers queries from a queue.
    #[derive(Clone, Default)]
    struct RecordingIo {
        log: Arc<StdMutex<Vec<String>>>,
        replies: Arc<StdMutex<VecDeque<Result<String>>>>,
    }

    impl RecordingIo {
        fn reply(&self, r: &str) {
            self.replies.lock().unwrap().push_back(Ok(r.to_string()));
        }
        fn fail_next(&self) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(Error::Transport("link down".into())));
        }
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InstrumentIo for RecordingIo {
        async fn write(&mut self, command: &str) -> Result<()> {
            self.log.lock().unwrap().push(command.to_string());
            let fail = matches!(self.replies.lock().unwrap().front(), Some(Err(_)));
            if fail {
                return self.replies.lock().unwrap().pop_front().unwrap().map(|_| ());
            }
            Ok(())
        }
        async fn query(&mut self, command: &str) -> Result<String> {
            self.log.lock().unwrap().push(command.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Timeout))
        }
        async fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>> {
            self.log.lock().unwrap().push(command.to_string());
            Ok(vec![1, 2, 3])
        }
        async fn query_raw(&mut self, command: &str) -> Result<Vec<u8>> {
            self.log.lock().unwrap().push(command.to_string());
            Ok(vec![4, 5, 6])
        }
    }

    fn read_doubled<'a>(s: &'a mut Session, slot: usize) -> AttributeFuture<'a, AttributeValue> {
        Box::pin(async move {
            let base = s.get("output.level", slot).await?.as_f64()?;
            Ok(AttributeValue::Float(base * 2.0))
        })
    }

    fn write_doubled<'a>(
        s: &'a mut Session,
        slot: usize,
        v: AttributeValue,
    ) -> AttributeFuture<'a, ()> {
        Box::pin(async move {
            let half = v.as_f64()? / 2.0;
            s.set("output.level", slot, half).await
        })
    }

    fn mark_function<'a>(
        s: &'a mut Session,
        slot: usize,
        _v: AttributeValue,
    ) -> AttributeFuture<'a, ()> {
        Box::pin(async move { s.store("output.mode", slot, "function") })
    }

    fn session(io: RecordingIo, simulate: bool) -> Session {
        let outputs = IndexDomain::new("outputs", IndexDomain::numbered_names("output", 2))
            .unwrap()
            .with_headers("source", IndexDomain::numbered_names("source", 2))
            .unwrap();
        let impedance = ValueTranslator::new("output.impedance", &[("HighZ", "OMEG"), ("50Ohms", "FIFTY")])
            .unwrap()
            .with_alias("FIFT", "50Ohms")
            .unwrap();
        let specs = vec![
            AttributeSpec::new("output.enabled", false)
                .over("outputs")
                .scpi(":{output}?", ":{output} {value}"),
            AttributeSpec::new("output.impedance", "50Ohms")
                .over("outputs")
                .translated(impedance)
                .scpi(":{output}:impedance?", ":{output}:impedance {value}"),
            AttributeSpec::new("output.mode", "function")
                .over("outputs")
                .constraint(crate::value::Constraint::OneOf(vec!["function", "arbitrary"])),
            AttributeSpec::new("output.amplitude", 1.0)
                .over("outputs")
                .range(0.01, 5.0)
                .scpi(":{source}:voltage?", ":{source}:voltage {value}")
                .coupled(mark_function),
            AttributeSpec::new("output.level", 1.0)
                .over("outputs")
                .scpi(":{source}:level?", ":{source}:level {value}"),
            AttributeSpec::new("output.double_level", 2.0)
                .over("outputs")
                .custom(read_doubled, write_doubled),
        ];
        let registry = AttributeRegistry::new(vec![outputs], specs).unwrap();
        Session::new(Box::new(io), registry, simulate)
    }

    #[tokio::test]
    async fn get_reads_once_then_hits_cache() {
        let io = RecordingIo::default();
        io.reply("1");
        let mut s = session(io.clone(), false);
        assert_eq!(s.get("output.enabled", "output2").await.unwrap(), AttributeValue::Bool(true));
        assert_eq!(s.get("output.enabled", 1usize).await.unwrap(), AttributeValue::Bool(true));
        assert_eq!(io.log(), vec![":output2?"]);
    }

    #[tokio::test]
    async fn set_then_get_short_circuits() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), false);
        s.set("output.amplitude", "output1", 0.01).await.unwrap();
        assert_eq!(s.get("output.amplitude", "output1").await.unwrap(), AttributeValue::Float(0.01));
        assert_eq!(io.log(), vec![":source1:voltage 1.000000e-02"]);
    }

    #[tokio::test]
    async fn range_error_before_io() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), false);
        let err = s.set("output.amplitude", 0usize, 0.005).await.unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
        assert!(io.log().is_empty());
        assert!(!s.is_valid("output.amplitude", 0usize).unwrap());
    }

    #[tokio::test]
    async fn unsupported_symbol_before_io() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), false);
        let err = s.set("output.impedance", 0usize, "75Ohms").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
        assert!(io.log().is_empty());
    }

    #[tokio::test]
    async fn index_resolution_error() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), false);
        let err = s.get("output.enabled", "output3").await.unwrap_err();
        assert!(matches!(err, Error::IndexResolution { .. }));
        assert!(io.log().is_empty());
    }

    #[tokio::test]
    async fn impedance_translated_both_ways() {
        let io = RecordingIo::default();
        io.reply("FIFT");
        let mut s = session(io.clone(), false);
        assert_eq!(
            s.get("output.impedance", 0usize).await.unwrap(),
            AttributeValue::Symbol("50Ohms".into())
        );
        s.set("output.impedance", 1usize, "HighZ").await.unwrap();
        s.set("output.impedance", 1usize, "50Ohms").await.unwrap();
        assert_eq!(
            io.log(),
            vec![
                ":output1:impedance?",
                ":output2:impedance OMEG",
                ":output2:impedance FIFTY"
            ]
        );
    }

    #[tokio::test]
    async fn simulate_suppresses_io_but_updates_cache() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), true);
        assert_eq!(s.get("output.enabled", 0usize).await.unwrap(), AttributeValue::Bool(false));
        s.set("output.enabled", 0usize, true).await.unwrap();
        assert!(s.is_valid("output.enabled", 0usize).unwrap());
        assert_eq!(s.get("output.enabled", 0usize).await.unwrap(), AttributeValue::Bool(true));
        assert!(io.log().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_leaves_cache_untouched() {
        let io = RecordingIo::default();
        io.fail_next();
        let mut s = session(io.clone(), false);
        let err = s.set("output.amplitude", 0usize, 2.0).await.unwrap_err();
        assert!(err.is_transport());
        assert!(!s.is_valid("output.amplitude", 0usize).unwrap());
        assert_eq!(s.cached("output.amplitude", 0usize).unwrap(), &AttributeValue::Float(1.0));
    }

    #[tokio::test]
    async fn failed_read_leaves_slot_invalid() {
        let io = RecordingIo::default();
        io.reply("garbage");
        let mut s = session(io.clone(), false);
        assert!(matches!(
            s.get("output.amplitude", 0usize).await,
            Err(Error::Protocol(_))
        ));
        assert!(!s.is_valid("output.amplitude", 0usize).unwrap());
    }

    #[tokio::test]
    async fn coupling_runs_after_primary_without_io() {
        let io = RecordingIo::default();
        let mut s = session(io.clone(), false);
        s.store("output.mode", 0usize, "arbitrary").unwrap();
        s.set("output.amplitude", 0usize, 2.0).await.unwrap();
        assert_eq!(s.cached("output.mode", 0usize).unwrap(), &AttributeValue::Symbol("function".into()));
        assert!(s.is_valid("output.mode", 0usize).unwrap());
        assert_eq!(io.log().len(), 1);
    }

    #[tokio::test]
    async fn custom_accessors_compose_with_plain_ones() {
        let io = RecordingIo::default();
        io.reply("1.5");
        let mut s = session(io.clone(), false);
        assert_eq!(
            s.get("output.double_level", 0usize).await.unwrap(),
            AttributeValue::Float(3.0)
        );
        s.set("output.double_level", 1usize, 4.0).await.unwrap();
        assert_eq!(s.get("output.level", 1usize).await.unwrap(), AttributeValue::Float(2.0));
        assert_eq!(
            io.log(),
            vec![":source1:level?", ":source2:level 2.000000e+00"]
        );
    }

    #[tokio::test]
    async fn invalidate_forces_reread() {
        let io = RecordingIo::default();
        io.reply("0");
        io.reply("1");
        let mut s = session(io.clone(), false);
        assert_eq!(s.get("output.enabled", 0usize).await.unwrap(), AttributeValue::Bool(false));
        s.invalidate("output.enabled", 0usize).unwrap();
        assert_eq!(s.get("output.enabled", 0usize).await.unwrap(), AttributeValue::Bool(true));
        assert_eq!(io.log().len(), 2);
    }

    fn instrument(io: RecordingIo, simulate: bool) -> Instrument {
        Instrument::new(
            InstrumentInfo {
                manufacturer: Manufacturer::Rigol,
                model_name: "MSO5072".into(),
                class: InstrumentClass::Oscilloscope,
            },
            session(io, simulate),
        )
    }

    #[tokio::test]
    async fn reset_invalidates_everything() {
        let io = RecordingIo::default();
        let inst = instrument(io.clone(), false);
        inst.set("output.enabled", 0usize, true).await.unwrap();
        inst.reset().await.unwrap();
        assert!(!inst.lock().await.is_valid("output.enabled", 0usize).unwrap());
        assert_eq!(io.log(), vec![":output1 1", "*RST"]);
    }

    #[tokio::test]
    async fn identify_parses_reply() {
        let io = RecordingIo::default();
        io.reply("RIGOL TECHNOLOGIES,MSO5072,MS5A1,00.01\n");
        let inst = instrument(io.clone(), false);
        let id = inst.identify().await.unwrap();
        assert_eq!(id.model, "MSO5072");
        inst.clear_status().await.unwrap();
        assert_eq!(io.log(), vec!["*IDN?", "*CLS"]);
    }

    #[tokio::test]
    async fn identify_simulated() {
        let io = RecordingIo::default();
        let inst = instrument(io.clone(), true);
        let id = inst.identify().await.unwrap();
        assert_eq!(id.manufacturer, "Rigol");
        assert_eq!(id.serial_number, "SIMULATED");
        assert!(io.log().is_empty());
    }

    #[tokio::test]
    async fn unknown_attribute_name() {
        let inst = instrument(RecordingIo::default(), false);
        assert!(matches!(
            inst.get("output.gain", 0usize).await,
            Err(Error::UnknownAttribute(_))
        ));
        assert_eq!(inst.attribute_names().await.len(), 6);
    }
}
