//! Serial port transport for RN2483 module communication.
//!
//! This module provides [`SerialLineTransport`], which implements the
//! [`LineTransport`] trait for USB virtual COM ports and physical UART
//! connections.
//!
//! The RN2483 always talks 57600 baud, 8 data bits, no parity, 1 stop bit,
//! no flow control, so there is far less to configure than on a generic
//! serial device; only the baud rate (for odd setups behind level shifters)
//! and the write timeout are adjustable.
//!
//! # Example
//!
//! ```no_run
//! use rn2483_transport::SerialLineTransport;
//! use rn2483_core::LineTransport;
//! use std::time::Duration;
//!
//! # async fn example() -> rn2483_core::Result<()> {
//! let mut transport = SerialLineTransport::open("/dev/ttyACM0").await?;
//!
//! transport.write(b"sys get hweui\r\n").await?;
//! let hweui = transport.read_line(Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use rn2483_core::error::{Error, Result};
use rn2483_core::transport::LineTransport;

/// Serial port configuration.
///
/// Defaults match the RN2483 datasheet: 57600 baud with a 2 second write
/// timeout. Data bits, parity, stop bits, and flow control are fixed at
/// 8N1/none, which is the only framing the module supports.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. The module itself is fixed at 57600; this is only
    /// adjustable for links that re-clock the UART.
    pub baud_rate: u32,
    /// How long a blocking write may take before it is reported as a
    /// write timeout.
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: SerialLineTransport::DEFAULT_BAUD,
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Cap on buffered bytes while waiting for a line terminator. Replies are
/// one short ASCII line; a buffer this full means line noise or a wedged
/// module, and the accumulated garbage is dropped.
const MAX_LINE: usize = 4096;

/// Serial port transport for RN2483 communication.
///
/// Implements the [`LineTransport`] trait for USB virtual COM ports and
/// physical UART connections to the module.
pub struct SerialLineTransport {
    /// The underlying serial port stream.
    port: Option<SerialStream>,
    /// Port name for logging/debugging.
    port_name: String,
    /// Write timeout from [`SerialConfig`].
    write_timeout: Duration,
    /// Bytes received but not yet returned as a complete line.
    pending: BytesMut,
}

impl SerialLineTransport {
    /// Default RN2483 baud rate per the Microchip datasheet.
    pub const DEFAULT_BAUD: u32 = 57_600;

    /// Open a serial port with the default RN2483 settings (57600 8N1).
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. `/dev/ttyACM0` on Linux, `COM3`
    ///   on Windows)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rn2483_transport::SerialLineTransport;
    /// # async fn example() -> rn2483_core::Result<()> {
    /// let transport = SerialLineTransport::open("/dev/ttyACM0").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(port: &str) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::default()).await
    }

    /// Open a serial port with explicit configuration.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            write_timeout_ms = config.write_timeout.as_millis() as u64,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Connection(format!("no LoRa module at {}: {}", port, e))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
            write_timeout: config.write_timeout,
            pending: BytesMut::new(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Pop one complete line out of the pending buffer, if present.
    ///
    /// Consumes up to and including the `\n`; strips `\r\n`.
    fn take_line(&mut self) -> Option<String> {
        let nl = self.pending.iter().position(|&b| b == b'\n')?;
        let line = self.pending.split_to(nl + 1);
        let mut end = line.len() - 1;
        if end > 0 && line[end - 1] == b'\r' {
            end -= 1;
        }
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }
}

#[async_trait]
impl LineTransport for SerialLineTransport {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            "Writing to module"
        );

        let write = async {
            port.write_all(data).await?;
            port.flush().await?;
            Ok::<_, std::io::Error>(())
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(data.len()),
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to write");
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::NotConnected
                {
                    Err(Error::NotConnected)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => {
                tracing::warn!(
                    port = %self.port_name,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "Write timed out"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        // A full line may already be buffered from a previous read.
        if let Some(line) = self.take_line() {
            tracing::trace!(port = %self.port_name, line = %line, "Read line (buffered)");
            return Ok(line);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut buf = [0u8; 256];

        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .ok_or(Error::Timeout)?;

            let port = self.port.as_mut().ok_or(Error::NotConnected)?;
            let n = match tokio::time::timeout(remaining, port.read(&mut buf)).await {
                Ok(Ok(0)) => return Err(Error::NotConnected),
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    tracing::error!(port = %self.port_name, error = %e, "Failed to read");
                    if e.kind() == std::io::ErrorKind::BrokenPipe
                        || e.kind() == std::io::ErrorKind::NotConnected
                    {
                        return Err(Error::NotConnected);
                    }
                    return Err(Error::Io(e));
                }
                Err(_) => {
                    tracing::trace!(
                        port = %self.port_name,
                        timeout_ms = timeout.as_millis() as u64,
                        "Timeout waiting for line"
                    );
                    return Err(Error::Timeout);
                }
            };

            self.pending.extend_from_slice(&buf[..n]);

            if let Some(line) = self.take_line() {
                tracing::trace!(port = %self.port_name, line = %line, "Read line");
                return Ok(line);
            }

            if self.pending.len() > MAX_LINE {
                tracing::warn!(
                    port = %self.port_name,
                    len = self.pending.len(),
                    "line buffer overflow, resetting"
                );
                self.pending.clear();
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            // Flush any pending data before closing.
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            // The port is dropped here, which closes it.
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
        self.pending.clear();

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.write_timeout, Duration::from_secs(2));
    }

    fn transport_with_pending(bytes: &[u8]) -> SerialLineTransport {
        SerialLineTransport {
            port: None,
            port_name: "test".into(),
            write_timeout: Duration::from_secs(2),
            pending: BytesMut::from(bytes),
        }
    }

    #[test]
    fn take_line_strips_crlf() {
        let mut t = transport_with_pending(b"ok\r\nradio_tx_ok\r\n");
        assert_eq!(t.take_line().as_deref(), Some("ok"));
        assert_eq!(t.take_line().as_deref(), Some("radio_tx_ok"));
        assert_eq!(t.take_line(), None);
    }

    #[test]
    fn take_line_bare_lf() {
        let mut t = transport_with_pending(b"busy\n");
        assert_eq!(t.take_line().as_deref(), Some("busy"));
    }

    #[test]
    fn take_line_blank_line_is_empty_string() {
        let mut t = transport_with_pending(b"\r\naccepted\r\n");
        assert_eq!(t.take_line().as_deref(), Some(""));
        assert_eq!(t.take_line().as_deref(), Some("accepted"));
    }

    #[test]
    fn take_line_incomplete_returns_none() {
        let mut t = transport_with_pending(b"radio_rx  48");
        assert_eq!(t.take_line(), None);
        // Data stays buffered for the next read cycle.
        assert_eq!(&t.pending[..], b"radio_rx  48");
    }

    #[tokio::test]
    async fn write_after_close_not_connected() {
        let mut t = transport_with_pending(b"");
        let result = t.write(b"mac pause\r\n").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn read_line_after_close_not_connected() {
        let mut t = transport_with_pending(b"");
        let result = t.read_line(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn read_line_prefers_buffered_data() {
        // Even with no port, a buffered line is returned without I/O.
        let mut t = transport_with_pending(b"ok\r\n");
        let line = t.read_line(Duration::from_millis(10)).await.unwrap();
        assert_eq!(line, "ok");
    }
}
