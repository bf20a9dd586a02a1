//! Error types for ivilib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Addressing errors, value validation
//! errors, protocol decode errors and transport failures are all captured
//! here so that callers can match on a single enum.

/// The error type for all ivilib operations.
///
/// The first group of variants is raised by the attribute layer before any
/// device I/O takes place; a call failing with one of them has no effect on
/// the instrument or on the attribute cache. The transport group is
/// propagated unchanged from the underlying link.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested channel/output index is not part of the driver's
    /// fixed index domain.
    #[error("index {index} not found in {domain}")]
    IndexResolution {
        /// The index as supplied by the caller.
        index: String,
        /// Human-readable description of the domain that was searched.
        domain: String,
    },

    /// A numeric write fell outside the attribute's declared bounds.
    #[error("value {value} out of range [{min}, {max}] for {attribute}")]
    OutOfRange {
        /// Attribute name.
        attribute: String,
        /// Rejected value.
        value: f64,
        /// Lower bound of the attribute.
        min: f64,
        /// Upper bound of the attribute.
        max: f64,
    },

    /// A symbolic value (written by the caller or reported by the device)
    /// has no entry in the attribute's enumeration mapping.
    #[error("unsupported value {value:?} for {attribute}")]
    UnsupportedValue {
        /// Attribute name.
        attribute: String,
        /// Rejected symbol or device token.
        value: String,
    },

    /// No attribute with this name exists in the driver's attribute table.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A value of the wrong kind was written to an attribute.
    #[error("type mismatch for {attribute}: expected {expected}")]
    TypeMismatch {
        /// Attribute name.
        attribute: String,
        /// The kind the attribute stores.
        expected: String,
    },

    /// An enumeration mapping or attribute table is malformed.
    ///
    /// Raised once, when the driver builds its tables, never on a lookup.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// A transport-level error (serial port, TCP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unparseable reply, malformed binary block).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response from the instrument.
    #[error("timeout waiting for response")]
    Timeout,

    /// The requested operation is not supported by this instrument model.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a builder or driver call.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the instrument has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the instrument was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error originated below the attribute layer (link or
    /// device protocol) rather than from argument validation.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Protocol(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_index_resolution() {
        let e = Error::IndexResolution {
            index: "output3".into(),
            domain: "outputs [output1, output2]".into(),
        };
        assert_eq!(
            e.to_string(),
            "index output3 not found in outputs [output1, output2]"
        );
    }

    #[test]
    fn error_display_out_of_range() {
        let e = Error::OutOfRange {
            attribute: "output.standard_waveform.amplitude".into(),
            value: 0.005,
            min: 0.01,
            max: 5.0,
        };
        assert_eq!(
            e.to_string(),
            "value 0.005 out of range [0.01, 5] for output.standard_waveform.amplitude"
        );
    }

    #[test]
    fn error_display_unsupported_value() {
        let e = Error::UnsupportedValue {
            attribute: "output.impedance".into(),
            value: "75Ohms".into(),
        };
        assert_eq!(
            e.to_string(),
            "unsupported value \"75Ohms\" for output.impedance"
        );
    }

    #[test]
    fn error_display_transport_group() {
        assert_eq!(
            Error::Transport("port busy".into()).to_string(),
            "transport error: port busy"
        );
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
        assert_eq!(Error::NotConnected.to_string(), "not connected");
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn transport_classification() {
        assert!(Error::Timeout.is_transport());
        assert!(Error::Protocol("bad block".into()).is_transport());
        assert!(!Error::UnknownAttribute("x".into()).is_transport());
        assert!(
            !Error::OutOfRange {
                attribute: "a".into(),
                value: 1.0,
                min: 0.0,
                max: 0.5,
            }
            .is_transport()
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
