//! TektronixBuilder -- fluent builder for constructing [`TektronixInstrument`] instances.
//!
//! Same connection options as the other vendor builders: LAN or serial,
//! a command timeout, and simulate mode.
//!
//! # Example
//!
//! ```no_run
//! use ivilib_tektronix::builder::TektronixBuilder;
//! use ivilib_tektronix::models::dpo7354c;
//! use std::time::Duration;
//!
//! # async fn example() -> ivilib_core::Result<()> {
//! let scope = TektronixBuilder::new(dpo7354c())
//!     .host("192.168.1.50")
//!     .command_timeout(Duration::from_secs(5))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::info;

use ivilib_core::{DisconnectedIo, Error, InstrumentIo, Result};
use ivilib_scpi::{DEFAULT_COMMAND_TIMEOUT, ScpiSession};
use ivilib_transport::{DEFAULT_SCPI_PORT, SerialTransport, TcpTransport};

use crate::instrument::TektronixInstrument;
use crate::models::TektronixModel;

/// Fluent builder for [`TektronixInstrument`].
#[derive(Debug, Clone)]
pub struct TektronixBuilder {
    model: TektronixModel,
    simulate: bool,
    host: Option<String>,
    port: u16,
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
}

impl TektronixBuilder {
    /// Create a new builder for the given DPO model.
    pub fn new(model: TektronixModel) -> Self {
        TektronixBuilder {
            model,
            simulate: false,
            host: None,
            port: DEFAULT_SCPI_PORT,
            serial_port: None,
            baud_rate: 9600,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Run without a device: fetches return empty traces and attributes
    /// come from cache.
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Connect over LAN to this host.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Raw SCPI socket port (default: 5555).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connect over this serial port (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Serial baud rate (default: 9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Timeout for a single command/reply exchange (default: 2s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Build a [`TektronixInstrument`] over caller-provided I/O.
    pub fn build_with_io(self, io: Box<dyn InstrumentIo>) -> Result<TektronixInstrument> {
        TektronixInstrument::new(io, self.model, self.simulate)
    }

    /// Open the configured transport and build a [`TektronixInstrument`].
    ///
    /// In simulate mode nothing is opened. Otherwise exactly one of
    /// [`host()`](Self::host) and [`serial_port()`](Self::serial_port)
    /// must have been called.
    pub async fn build(self) -> Result<TektronixInstrument> {
        if self.simulate {
            return self.build_with_io(Box::new(DisconnectedIo));
        }
        let session = match (&self.host, &self.serial_port) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParameter(
                    "host and serial_port are mutually exclusive".into(),
                ));
            }
            (None, None) => {
                return Err(Error::InvalidParameter(
                    "host or serial_port is required for build()".into(),
                ));
            }
            (Some(host), None) => {
                let transport = TcpTransport::connect_host(host, self.port).await?;
                ScpiSession::new(Box::new(transport))
            }
            (None, Some(port)) => {
                let transport = SerialTransport::open(port, self.baud_rate).await?;
                ScpiSession::new(Box::new(transport))
            }
        };
        info!(model = self.model.name, "tektronix instrument connected");
        let io = session.with_timeout(self.command_timeout);
        self.build_with_io(Box::new(io))
    }
}
