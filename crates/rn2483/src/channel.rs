//! Command channel: one command out, one reply line back.
//!
//! [`CommandChannel`] owns the [`LineTransport`] exclusively and implements
//! the lowest protocol layer: frame a command, write it, read exactly one
//! reply line, and optionally verify the reply against an expected token.
//!
//! Failure classification happens here:
//!
//! - a write that accepts zero bytes is a write timeout
//!   ([`Error::Transmission`]),
//! - a short write is a partial write ([`Error::Transmission`], not retried),
//! - a read that produces no line within the window is [`Error::Timeout`]
//!   (the module stalled, the link did not),
//! - a reply that fails verification is [`Error::Reception`] -- except
//!   `busy` after a `radio rx` command, which means the receiver was
//!   already armed and is swallowed.

use std::time::Duration;

use tracing::{debug, trace};

use rn2483_core::error::{Error, Result};
use rn2483_core::transport::LineTransport;

use crate::protocol;

/// Observer for wire traffic.
///
/// When the debug flag is set, the channel reports every command line
/// written and every reply line read. The default implementation
/// ([`LogTrace`]) forwards to the `tracing` subscriber; tests install a
/// recording implementation to assert on the traffic.
pub trait WireTrace: Send + Sync {
    fn on_write(&self, line: &str);
    fn on_read(&self, line: &str);
}

/// Default trace that logs wire traffic via `tracing`.
pub struct LogTrace;

impl WireTrace for LogTrace {
    fn on_write(&self, line: &str) {
        debug!(line = %line, "wire write");
    }

    fn on_read(&self, line: &str) {
        debug!(line = %line, "wire read");
    }
}

/// The command/reply exchange engine.
///
/// Owns the transport for the lifetime of the connection; nothing else may
/// read or write it. One command is in flight at a time, which the `&mut`
/// receivers enforce.
pub struct CommandChannel {
    transport: Box<dyn LineTransport>,
    read_timeout: Duration,
    debug: bool,
    trace: Box<dyn WireTrace>,
}

impl CommandChannel {
    pub fn new(
        transport: Box<dyn LineTransport>,
        read_timeout: Duration,
        debug: bool,
        trace: Box<dyn WireTrace>,
    ) -> Self {
        CommandChannel {
            transport,
            read_timeout,
            debug,
            trace,
        }
    }

    /// Whether the debug trace is enabled.
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// The configured serial line-read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Frame and write one command line.
    ///
    /// A zero-byte write and a partial write are reported as distinct
    /// [`Error::Transmission`] failures; neither is retried here.
    pub async fn write_line(&mut self, cmd: &str) -> Result<()> {
        let frame = protocol::frame_command(cmd);

        let written = match self.transport.write(&frame).await {
            Ok(n) => n,
            // The transport reports its own write timeout; classify it the
            // same as a zero-byte write.
            Err(Error::Timeout) => 0,
            Err(e) => return Err(e),
        };

        if written == 0 {
            return Err(Error::Transmission("write failed due to timeout".into()));
        }
        if written < frame.len() {
            return Err(Error::Transmission("write was incomplete".into()));
        }

        trace!(cmd = %cmd, "command written");
        if self.debug {
            self.trace.on_write(cmd);
        }
        Ok(())
    }

    /// Read one reply line within the configured serial timeout.
    pub async fn read_line(&mut self) -> Result<String> {
        self.read_line_within(self.read_timeout).await
    }

    /// Read one reply line within an explicit window.
    ///
    /// Used by the passive-receive wait, whose bound is the module watchdog
    /// rather than the serial timeout.
    pub async fn read_line_within(&mut self, timeout: Duration) -> Result<String> {
        let line = self.transport.read_line(timeout).await?;

        trace!(line = %line, "reply read");
        if self.debug {
            self.trace.on_read(&line);
        }
        Ok(line)
    }

    /// Send one command and read its reply, optionally verifying it.
    ///
    /// With `expected` present, the reply is trimmed of trailing whitespace
    /// and compared for exact equality. A mismatch is a reception error,
    /// with one exception: `busy` in reply to a receive-mode command means
    /// the module is already receiving and is not an error for callers that
    /// re-arm the receiver repeatedly.
    ///
    /// Returns the raw reply line.
    pub async fn execute(&mut self, cmd: &str, expected: Option<&str>) -> Result<String> {
        self.write_line(cmd).await?;
        let reply = self.read_line().await?;

        if let Some(token) = expected {
            let got = reply.trim_end();
            if got != token {
                if protocol::is_receive_command(cmd) && got == protocol::BUSY {
                    debug!(cmd = %cmd, "receiver already armed, busy reply tolerated");
                } else {
                    return Err(Error::Reception(format!(
                        "expected `{token}`, module replied `{got}`"
                    )));
                }
            }
        }

        Ok(reply)
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Whether the underlying transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}
