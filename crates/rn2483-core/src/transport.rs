//! Line-transport trait for module communication.
//!
//! The [`LineTransport`] trait abstracts over the physical link to the LoRa
//! module. Implementations exist for serial ports (desktop USB/UART) and for
//! mock transports used in deterministic protocol tests.
//!
//! The protocol engine in the `rn2483` crate operates on a `LineTransport`
//! rather than directly on a serial port, so the same command/response logic
//! drives real hardware and the `MockLineTransport` from the
//! `rn2483-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous line-oriented transport to the module.
///
/// The RN2483 command protocol is strictly line-based: every command is one
/// ASCII line terminated with `\r\n`, every reply is one line. Implementations
/// handle buffering and terminator stripping; protocol-level concerns (command
/// grammar, reply classification) live in the driver that consumes this trait.
#[async_trait]
pub trait LineTransport: Send + Sync {
    /// Write raw bytes to the module.
    ///
    /// Returns the number of bytes actually accepted by the underlying
    /// transport. Callers treat a zero-byte result as a write timeout and a
    /// short count as a partial write; neither is retried here.
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read one line from the module, waiting up to `timeout`.
    ///
    /// The returned line has its `\r\n` terminator stripped. A bare
    /// terminator yields an empty string, which is distinct from a timeout:
    /// if no complete line arrives within the deadline, the call fails with
    /// [`Error::Timeout`](crate::error::Error::Timeout).
    async fn read_line(&mut self, timeout: Duration) -> Result<String>;

    /// Close the transport connection.
    ///
    /// After `close()`, subsequent `write()` and `read_line()` calls return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
