//! Rn2483 -- the live connection to a module, and the point-to-point
//! transmit/receive operations.
//!
//! A [`Rn2483`] only exists after the full radio configuration sequence
//! verified (see [`Rn2483Builder`](crate::builder::Rn2483Builder)), so every
//! method here can assume a configured module.
//!
//! The module's transmit/receive role is shared, mutable, external state.
//! Nothing here trusts it: every `send`/`recv` re-establishes the role it
//! needs from scratch (pause, then configure), so calls are independent and
//! the driver holds no role state between them.

use std::time::Duration;

use tracing::{debug, warn};

use rn2483_core::error::{Error, Result};

use crate::channel::CommandChannel;
use crate::codec;
use crate::protocol;
use crate::wan::WanMode;

/// A live, configured connection to an RN2483 module.
///
/// Constructed via [`Rn2483Builder`](crate::builder::Rn2483Builder). The
/// connection exclusively owns its transport; `&mut self` receivers keep a
/// single command in flight at a time, matching the module's half-duplex
/// command protocol.
pub struct Rn2483 {
    pub(crate) channel: CommandChannel,
    /// Module receive watchdog in milliseconds; 0 = disabled.
    pub(crate) watchdog_ms: u64,
    /// Current LoRaWAN provisioning mode.
    pub(crate) wan_mode: WanMode,
}

impl Rn2483 {
    /// Transmit a hex-encoded payload point-to-point.
    ///
    /// Pauses the MAC layer, hands the payload to the radio, and waits for
    /// the on-air confirmation (`radio_tx_ok`). A failure to pause is a
    /// [`Error::Configuration`]; anything that goes wrong after that,
    /// including a missing confirmation, is a [`Error::Transmission`].
    pub async fn send(&mut self, payload: &str) -> Result<()> {
        debug!("preparing for transmission");

        if let Err(e) = self.channel.execute("mac pause", None).await {
            return Err(escalate_role_failure(
                "configuration as transmitter failed",
                e,
            ));
        }

        debug!(payload = %payload, "transmitting");
        self.transmit(payload).await.map_err(|e| match e {
            Error::Transmission(_) | Error::Reception(_) | Error::Timeout => {
                Error::Transmission(format!("error while sending: {e}"))
            }
            other => other,
        })
    }

    async fn transmit(&mut self, payload: &str) -> Result<()> {
        self.channel
            .execute(&format!("radio tx {payload}"), Some(protocol::OK))
            .await?;

        // The command reply only means "accepted for transmission"; the
        // radio reports completion with a second, asynchronous line.
        let confirm = self.channel.read_line().await?;
        if confirm.trim() != protocol::RADIO_TX_OK {
            return Err(Error::Transmission(
                "no transmission confirmation received".into(),
            ));
        }
        Ok(())
    }

    /// Arm the receiver and block until a packet arrives.
    ///
    /// Returns the received hex payload with the `radio_rx` metadata prefix
    /// stripped. The wait is bounded by the module watchdog when one was
    /// configured (the module then answers `radio_err`, surfaced as
    /// [`Error::Timeout`]); otherwise by the serial read timeout. A timeout
    /// here is an expected condition -- callers typically re-arm in a loop.
    pub async fn recv(&mut self) -> Result<String> {
        debug!("preparing for reception");

        if let Err(e) = self.configure_receiver().await {
            return Err(escalate_role_failure("configuration as receiver failed", e));
        }

        // Debug-only diagnostic; reception works fine without it.
        if self.channel.debug_enabled() {
            match self.query_snr().await {
                Ok(snr) => debug!(snr = %snr, "receiver snr"),
                Err(e) => warn!(error = %e, "could not obtain snr value"),
            }
        }

        debug!("receiving");
        let line = self.channel.read_line_within(self.receive_window()).await?;

        if line.trim() == protocol::RADIO_ERR {
            // Module watchdog fired before a packet arrived.
            return Err(Error::Timeout);
        }

        match protocol::strip_rx_metadata(&line) {
            Some(payload) => {
                debug!(payload = %payload, "received");
                Ok(payload.to_string())
            }
            None => Err(Error::Reception(format!(
                "malformed receive response `{}`",
                line.trim()
            ))),
        }
    }

    async fn configure_receiver(&mut self) -> Result<()> {
        self.channel.execute("mac pause", None).await?;
        self.channel
            .execute("radio rx 0", Some(protocol::OK))
            .await?;
        Ok(())
    }

    /// Query the signal-to-noise ratio of the last reception (-128..=127).
    async fn query_snr(&mut self) -> Result<String> {
        self.channel.write_line("radio get snr").await?;
        let snr = self.channel.read_line().await?;
        Ok(snr.trim().to_string())
    }

    /// How long to wait for an inbound packet.
    fn receive_window(&self) -> Duration {
        if self.watchdog_ms > 0 {
            // Give the module watchdog room to fire and deliver its
            // `radio_err` line before the serial read gives up.
            Duration::from_millis(self.watchdog_ms) + self.channel.read_timeout()
        } else {
            self.channel.read_timeout()
        }
    }

    /// Transmit a text payload, hex-encoding it on the way out.
    pub async fn send_str(&mut self, text: &str) -> Result<()> {
        self.send(&codec::encode_payload(text)).await
    }

    /// Receive a packet and decode its hex payload to text.
    ///
    /// An odd-length payload is a corrupted reception and fails with
    /// [`Error::Reception`]; it is never truncated to the nearest byte.
    pub async fn recv_str(&mut self) -> Result<String> {
        let payload = self.recv().await?;
        codec::decode_payload(&payload)
    }

    /// Close the connection, releasing the serial transport.
    pub async fn close(&mut self) -> Result<()> {
        self.channel.close().await
    }

    /// Whether the underlying transport is still connected.
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }
}

/// Role setup re-classification: a protocol failure while establishing the
/// transmit/receive role is a configuration failure of that role. Timeouts
/// and link-loss keep their own kind.
fn escalate_role_failure(context: &str, err: Error) -> Error {
    match err {
        Error::Transmission(_) | Error::Reception(_) => {
            Error::Configuration(format!("{context}: {err}"))
        }
        other => other,
    }
}
