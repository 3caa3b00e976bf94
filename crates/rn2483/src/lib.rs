//! # rn2483 -- RN2483 LoRa / LoRaWAN module driver
//!
//! An asynchronous Rust driver for the Microchip RN2483 LoRa module,
//! speaking its line-oriented command protocol over a serial link. It covers
//! point-to-point radio transmit/receive and the LoRaWAN session lifecycle
//! (OTAA/ABP provisioning, join, uplink).
//!
//! ## Quick start
//!
//! ```no_run
//! use rn2483::Rn2483Builder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut radio = Rn2483Builder::new()
//!         .serial_port("/dev/ttyACM0")
//!         .build()
//!         .await?;
//!
//!     radio.send_str("Hi").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The workspace is organized as focused crates:
//!
//! | Crate                 | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | `rn2483-core`         | [`LineTransport`] trait, [`Error`]/[`Result`]|
//! | `rn2483-transport`    | Serial transport implementation              |
//! | `rn2483-test-harness` | `MockLineTransport` for protocol tests       |
//! | **`rn2483`**          | This crate -- the protocol engine and driver |
//!
//! Within this crate:
//!
//! - [`protocol`] -- command framing and status tokens
//! - [`codec`] -- hex payload encode/decode
//! - [`channel`] -- one-command-one-reply exchange with verification
//! - [`radio`] -- [`Rn2483`]: point-to-point send/receive
//! - [`wan`] -- LoRaWAN provisioning, join, and uplink
//! - [`builder`] -- [`Rn2483Builder`], which runs the radio configuration
//!   sequence so that only fully-configured connections exist
//!
//! ## Error handling
//!
//! Everything returns [`Result`]. [`Error::Timeout`] during a passive
//! receive is ordinary -- nothing was on the air -- and is the one error
//! callers typically catch and loop on; the driver itself never retries.
//!
//! ## Concurrency model
//!
//! The module is half-duplex at the command level, so all operations take
//! `&mut self` and exactly one command is in flight per connection. One
//! connection owns one serial port; do not open two connections to the same
//! port.

pub mod builder;
pub mod channel;
pub mod codec;
pub mod config;
pub mod protocol;
pub mod radio;
pub mod wan;

// Re-export the primary types for ergonomic `use rn2483::*`.
pub use builder::Rn2483Builder;
pub use channel::{LogTrace, WireTrace};
pub use radio::Rn2483;
pub use wan::{AbpCredentials, OtaaCredentials, UplinkKind, WanMode};

// Core types, so most applications only need this crate.
pub use rn2483_core::{Error, LineTransport, Result};
