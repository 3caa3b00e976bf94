//! Error types for the RN2483 driver.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! LoRaWAN-session errors are all captured here.

/// The error type for all driver operations.
///
/// The variants mirror the failure modes of a serially-attached LoRa module:
/// the link itself can fail, the module can reject a setup command, a
/// transmission or reception can go wrong, the module can stall, or the
/// LoRaWAN network can refuse a join.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial link to the module could not be opened or configured.
    #[error("connection error: {0}")]
    Connection(String),

    /// The module rejected, or never confirmed, a setup command.
    ///
    /// Raised during initial radio configuration and when a `mac pause`
    /// fails while establishing a transmit/receive role.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A write failed, was incomplete, or a transmit confirmation is missing.
    #[error("transmission error: {0}")]
    Transmission(String),

    /// A reply did not match the expected token, or a payload failed to decode.
    #[error("reception error: {0}")]
    Reception(String),

    /// No data arrived within the configured window.
    ///
    /// Distinct from [`Reception`](Error::Reception): a timeout signals that
    /// the module (or the air) stalled, not that the protocol was violated.
    /// During a passive receive this is an expected, retryable condition.
    #[error("timeout waiting for module response")]
    Timeout,

    /// The LoRaWAN network rejected the join request.
    ///
    /// Carries the module's literal response text (e.g. `denied`).
    #[error("join rejected by network: {0}")]
    Join(String),

    /// No connection to the module has been established, or it was closed.
    #[error("not connected")]
    NotConnected,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_connection() {
        let e = Error::Connection("no module at /dev/ttyACM0".into());
        assert_eq!(e.to_string(), "connection error: no module at /dev/ttyACM0");
    }

    #[test]
    fn error_display_configuration() {
        let e = Error::Configuration("initial configuration failed".into());
        assert_eq!(
            e.to_string(),
            "configuration error: initial configuration failed"
        );
    }

    #[test]
    fn error_display_transmission() {
        let e = Error::Transmission("write was incomplete".into());
        assert_eq!(e.to_string(), "transmission error: write was incomplete");
    }

    #[test]
    fn error_display_reception() {
        let e = Error::Reception("received data has odd length".into());
        assert_eq!(
            e.to_string(),
            "reception error: received data has odd length"
        );
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timeout waiting for module response");
    }

    #[test]
    fn error_display_join_carries_reply() {
        let e = Error::Join("denied".into());
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn error_display_not_connected() {
        let e = Error::NotConnected;
        assert_eq!(e.to_string(), "not connected");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
