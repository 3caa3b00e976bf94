//! rn2483-core: Core trait and error definitions for the RN2483 driver.
//!
//! This crate defines the transport-agnostic abstractions shared by the
//! driver and its transports. Applications depend on these types without
//! pulling in a serial-port stack.
//!
//! # Key types
//!
//! - [`LineTransport`] -- line-oriented communication channel to the module
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;

// Re-export key types at crate root for ergonomic `use rn2483_core::*`.
pub use error::{Error, Result};
pub use transport::LineTransport;
