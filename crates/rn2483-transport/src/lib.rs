//! Transport implementations for the RN2483 driver.
//!
//! This crate provides the concrete [`LineTransport`](rn2483_core::LineTransport)
//! implementation for real hardware:
//!
//! - [`SerialLineTransport`]: USB virtual COM ports and UART connections
//!
//! For tests, use `MockLineTransport` from the `rn2483-test-harness` crate
//! instead; the driver never cares which one it is handed.
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
//! let line = transport.read_line(Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{SerialConfig, SerialLineTransport};
