//! Rn2483Builder -- fluent builder for establishing module connections.
//!
//! Separates configuration from construction so that callers can set up the
//! serial port, timeouts, and debug tracing before the connection is opened.
//! Construction runs the full radio configuration sequence; a [`Rn2483`]
//! value therefore only exists for a module that confirmed every setup
//! command.
//!
//! # Example
//!
//! ```no_run
//! use rn2483::Rn2483Builder;
//! use std::time::Duration;
//!
//! # async fn example() -> rn2483_core::Result<()> {
//! let radio = Rn2483Builder::new()
//!     .serial_port("/dev/ttyACM0")
//!     .read_timeout(Duration::from_secs(2))
//!     .watchdog_timeout_ms(2000)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rn2483_core::error::{Error, Result};
use rn2483_core::transport::LineTransport;
use rn2483_transport::{SerialConfig, SerialLineTransport};

use crate::channel::{CommandChannel, LogTrace, WireTrace};
use crate::config;
use crate::radio::Rn2483;
use crate::wan::WanMode;

/// Fluent builder for [`Rn2483`].
///
/// Defaults: 57600 baud, 2 second serial read/write timeout, 2 second
/// module receive watchdog, debug tracing off.
pub struct Rn2483Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    read_timeout: Duration,
    watchdog_ms: u64,
    debug: bool,
    trace: Option<Box<dyn WireTrace>>,
}

impl Rn2483Builder {
    /// Create a builder with the default settings.
    pub fn new() -> Self {
        Rn2483Builder {
            serial_port: None,
            baud_rate: SerialLineTransport::DEFAULT_BAUD,
            read_timeout: Duration::from_millis(2000),
            watchdog_ms: 2000,
            debug: false,
            trace: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyACM0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate (57600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the serial read/write timeout (default: 2 seconds).
    ///
    /// Bounds every single line read and write on the link; during a join or
    /// uplink this is also how long the confirmation wait lasts.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the module receive watchdog in milliseconds (default: 2000).
    ///
    /// Pass 0 to disable: a passive receive then waits only as long as the
    /// serial read timeout per attempt.
    pub fn watchdog_timeout_ms(mut self, ms: u64) -> Self {
        self.watchdog_ms = ms;
        self
    }

    /// Enable the debug wire trace (default: off).
    ///
    /// Also enables the SNR side-query during `recv()`.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Install a custom [`WireTrace`] observer.
    ///
    /// Only consulted when the debug flag is set. Defaults to [`LogTrace`],
    /// which forwards to the `tracing` subscriber.
    pub fn trace(mut self, trace: Box<dyn WireTrace>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Build a [`Rn2483`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockLineTransport` from
    /// `rn2483-test-harness`) and for platforms with their own UART stack.
    /// The full radio configuration sequence runs here; on any failure the
    /// transport is discarded and no connection value is produced.
    pub async fn build_with_transport(self, transport: Box<dyn LineTransport>) -> Result<Rn2483> {
        let trace = self.trace.unwrap_or_else(|| Box::new(LogTrace));
        let mut channel = CommandChannel::new(transport, self.read_timeout, self.debug, trace);

        config::apply_radio_config(&mut channel, self.watchdog_ms).await?;

        Ok(Rn2483 {
            channel,
            watchdog_ms: self.watchdog_ms,
            wan_mode: WanMode::None,
        })
    }

    /// Build a [`Rn2483`] over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Rn2483> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::Connection("serial_port is required for build()".into()))?
            .to_string();

        let config = SerialConfig {
            baud_rate: self.baud_rate,
            write_timeout: self.read_timeout,
        };
        let transport = SerialLineTransport::open_with_config(&port, config).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for Rn2483Builder {
    fn default() -> Self {
        Self::new()
    }
}
