//! Test harness for the RN2483 driver.
//!
//! Provides [`MockLineTransport`], a scripted [`LineTransport`](rn2483_core::LineTransport)
//! implementation for exercising the protocol engine without hardware.

pub mod mock_serial;

pub use mock_serial::{MockLineTransport, SentLog};
