//! LoRaWAN session operations: provisioning, join, uplink.
//!
//! These sit directly on the command channel, independent of the
//! point-to-point operations in [`radio`](crate::radio). Two provisioning
//! paths exist -- over-the-air activation (OTAA, dynamic key exchange via a
//! join handshake) and activation by personalization (ABP, pre-shared
//! session keys). Credentials are assumed to be pre-validated hex strings;
//! the module rejects anything malformed.
//!
//! The join verdict and the uplink confirmation are asynchronous relative to
//! their commands: the module first answers `ok`, then later pushes a second
//! line. Blank lines can interleave before it and are skipped.

use std::fmt;

use tracing::{debug, warn};

use rn2483_core::error::{Error, Result};

use crate::protocol;
use crate::radio::Rn2483;

/// Default LoRaWAN port for uplinks.
pub const DEFAULT_UPLINK_PORT: u8 = 4;

/// LoRaWAN provisioning mode of a connection.
///
/// Starts as [`None`](WanMode::None); set by [`Rn2483::config_otaa`] or
/// [`Rn2483::config_abp`]. The mode names double as the `mac join` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanMode {
    /// No LoRaWAN provisioning configured.
    None,
    /// Over-the-air activation.
    Otaa,
    /// Activation by personalization.
    Abp,
}

impl fmt::Display for WanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WanMode::None => write!(f, "none"),
            WanMode::Otaa => write!(f, "otaa"),
            WanMode::Abp => write!(f, "abp"),
        }
    }
}

/// OTAA provisioning keys, as hex strings.
#[derive(Debug, Clone)]
pub struct OtaaCredentials {
    /// Application key (16 bytes hex).
    pub appkey: String,
    /// Application EUI (8 bytes hex).
    pub appeui: String,
    /// Device EUI (8 bytes hex).
    pub deveui: String,
}

/// ABP pre-shared session keys, as hex strings.
#[derive(Debug, Clone)]
pub struct AbpCredentials {
    /// Network session key (16 bytes hex).
    pub nwkskey: String,
    /// Application session key (16 bytes hex).
    pub appskey: String,
    /// Device address (4 bytes hex).
    pub devaddr: String,
}

/// Uplink message type: whether the network must acknowledge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkKind {
    /// Fire-and-forget (`uncnf`).
    Unconfirmed,
    /// Network-acknowledged (`cnf`).
    Confirmed,
}

impl UplinkKind {
    fn as_str(self) -> &'static str {
        match self {
            UplinkKind::Unconfirmed => "uncnf",
            UplinkKind::Confirmed => "cnf",
        }
    }
}

impl fmt::Display for UplinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Rn2483 {
    /// Configure over-the-air activation.
    ///
    /// Enables adaptive data rate, programs the device EUI, application key
    /// and application EUI, and persists the MAC configuration. Returns the
    /// module's hardware EUI as reported by `sys get hweui` -- useful for
    /// registering the device with a network server.
    pub async fn config_otaa(&mut self, creds: &OtaaCredentials) -> Result<String> {
        self.channel
            .execute("mac set adr on", Some(protocol::OK))
            .await?;

        self.channel.write_line("sys get hweui").await?;
        let hweui = self.channel.read_line().await?;

        self.channel
            .execute(&format!("mac set deveui {}", creds.deveui), Some(protocol::OK))
            .await?;
        self.channel
            .execute(&format!("mac set appkey {}", creds.appkey), Some(protocol::OK))
            .await?;
        self.channel
            .execute(&format!("mac set appeui {}", creds.appeui), Some(protocol::OK))
            .await?;
        self.channel
            .execute("mac save", Some(protocol::OK))
            .await?;

        self.wan_mode = WanMode::Otaa;
        debug!(hweui = %hweui.trim_end(), "configured for otaa");
        Ok(hweui.trim_end().to_string())
    }

    /// Configure activation by personalization.
    ///
    /// Enables adaptive data rate, programs the pre-shared session keys and
    /// device address, and persists the MAC configuration. No join handshake
    /// is involved beyond telling the module `mac join abp` afterwards.
    pub async fn config_abp(&mut self, creds: &AbpCredentials) -> Result<()> {
        self.channel
            .execute("mac set adr on", Some(protocol::OK))
            .await?;

        self.channel
            .execute(
                &format!("mac set nwkskey {}", creds.nwkskey),
                Some(protocol::OK),
            )
            .await?;
        self.channel
            .execute(
                &format!("mac set appskey {}", creds.appskey),
                Some(protocol::OK),
            )
            .await?;
        self.channel
            .execute(
                &format!("mac set devaddr {}", creds.devaddr),
                Some(protocol::OK),
            )
            .await?;
        self.channel
            .execute("mac save", Some(protocol::OK))
            .await?;

        self.wan_mode = WanMode::Abp;
        debug!("configured for abp");
        Ok(())
    }

    /// The currently configured provisioning mode.
    pub fn wan_mode(&self) -> WanMode {
        self.wan_mode
    }

    /// Join the LoRaWAN network using the configured provisioning mode.
    ///
    /// The module answers `ok` to the join command immediately; the actual
    /// verdict arrives as a later asynchronous line. Blank lines before it
    /// are skipped. Anything other than `accepted` fails with
    /// [`Error::Join`] carrying the module's literal response.
    pub async fn join(&mut self) -> Result<()> {
        let mode = self.wan_mode;
        if mode == WanMode::None {
            return Err(Error::Configuration(
                "join requires OTAA or ABP provisioning".into(),
            ));
        }

        self.channel
            .execute("mac resume", Some(protocol::OK))
            .await?;
        self.channel
            .execute(&format!("mac join {mode}"), Some(protocol::OK))
            .await?;

        let verdict = self.await_confirmation().await?;
        if verdict != protocol::ACCEPTED {
            return Err(Error::Join(verdict));
        }

        debug!(mode = %mode, "joined LoRaWAN network");
        Ok(())
    }

    /// Send a LoRaWAN uplink with the default settings (unconfirmed, port 4).
    ///
    /// `data` is the hex payload for the `mac tx` command.
    pub async fn send_uplink(&mut self, data: &str) -> Result<()> {
        self.send_uplink_on(data, UplinkKind::Unconfirmed, DEFAULT_UPLINK_PORT)
            .await
    }

    /// Send a LoRaWAN uplink with an explicit message type and port.
    ///
    /// Resumes the MAC layer, transmits, and waits for the asynchronous
    /// `mac_tx_ok` confirmation (skipping blank lines). Whatever happens, a
    /// `mac pause` goes out on the way back so the module is left quiescent
    /// for subsequent point-to-point radio use.
    pub async fn send_uplink_on(
        &mut self,
        data: &str,
        kind: UplinkKind,
        port: u8,
    ) -> Result<()> {
        debug!(kind = %kind, port, "sending uplink");
        self.channel.execute("mac resume", None).await?;

        let result = self.uplink_exchange(data, kind, port).await;

        // Leave the MAC paused on every exit path.
        let pause = self.channel.execute("mac pause", None).await;

        match (result, pause) {
            (Ok(()), Ok(_)) => Ok(()),
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(pause_err)) => {
                warn!(error = %pause_err, "mac pause after failed uplink also failed");
                Err(e)
            }
        }
    }

    async fn uplink_exchange(&mut self, data: &str, kind: UplinkKind, port: u8) -> Result<()> {
        self.channel
            .execute(
                &format!("mac tx {} {} {}", kind.as_str(), port, data),
                Some(protocol::OK),
            )
            .await?;

        let verdict = self.await_confirmation().await?;
        if verdict != protocol::MAC_TX_OK {
            // Carry the module's literal reply (e.g. `invalid_data_len`,
            // `not_joined`).
            return Err(Error::Transmission(verdict));
        }
        Ok(())
    }

    /// Read lines until a non-blank one arrives.
    ///
    /// Join verdicts and uplink confirmations are asynchronous; the module
    /// may emit bare terminators first. A transport read timeout bounds the
    /// wait and propagates as [`Error::Timeout`].
    async fn await_confirmation(&mut self) -> Result<String> {
        loop {
            let line = self.channel.read_line().await?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Rn2483Builder;
    use crate::config::RADIO_SETUP;
    use rn2483_test_harness::{MockLineTransport, SentLog};

    fn configured_mock() -> MockLineTransport {
        let mut mock = MockLineTransport::new();
        for cmd in RADIO_SETUP {
            mock.expect(cmd, &["ok"]);
        }
        mock
    }

    async fn driver(mock: MockLineTransport) -> (Rn2483, SentLog) {
        let log = mock.log_handle();
        let radio = Rn2483Builder::new()
            .watchdog_timeout_ms(0)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();
        (radio, log)
    }

    fn otaa_creds() -> OtaaCredentials {
        OtaaCredentials {
            appkey: "0102030405060708090a0b0c0d0e0f10".into(),
            appeui: "0000000000000001".into(),
            deveui: "0004a30b001a55ed".into(),
        }
    }

    fn abp_creds() -> AbpCredentials {
        AbpCredentials {
            nwkskey: "101112131415161718191a1b1c1d1e1f".into(),
            appskey: "202122232425262728292a2b2c2d2e2f".into(),
            devaddr: "26011cf4".into(),
        }
    }

    fn expect_otaa_config(mock: &mut MockLineTransport) {
        mock.expect("mac set adr on", &["ok"]);
        mock.expect("sys get hweui", &["0004a30b001a55ed"]);
        mock.expect("mac set deveui 0004a30b001a55ed", &["ok"]);
        mock.expect("mac set appkey 0102030405060708090a0b0c0d0e0f10", &["ok"]);
        mock.expect("mac set appeui 0000000000000001", &["ok"]);
        mock.expect("mac save", &["ok"]);
    }

    // -------------------------------------------------------------------
    // Provisioning
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn config_otaa_returns_hweui_and_sets_mode() {
        let mut mock = configured_mock();
        expect_otaa_config(&mut mock);

        let (mut radio, _log) = driver(mock).await;
        assert_eq!(radio.wan_mode(), WanMode::None);

        let hweui = radio.config_otaa(&otaa_creds()).await.unwrap();
        assert_eq!(hweui, "0004a30b001a55ed");
        assert_eq!(radio.wan_mode(), WanMode::Otaa);
    }

    #[tokio::test]
    async fn config_abp_sets_mode() {
        let mut mock = configured_mock();
        mock.expect("mac set adr on", &["ok"]);
        mock.expect("mac set nwkskey 101112131415161718191a1b1c1d1e1f", &["ok"]);
        mock.expect("mac set appskey 202122232425262728292a2b2c2d2e2f", &["ok"]);
        mock.expect("mac set devaddr 26011cf4", &["ok"]);
        mock.expect("mac save", &["ok"]);

        let (mut radio, _log) = driver(mock).await;
        radio.config_abp(&abp_creds()).await.unwrap();
        assert_eq!(radio.wan_mode(), WanMode::Abp);
    }

    #[tokio::test]
    async fn config_otaa_rejected_key_leaves_mode_unset() {
        let mut mock = configured_mock();
        mock.expect("mac set adr on", &["ok"]);
        mock.expect("sys get hweui", &["0004a30b001a55ed"]);
        mock.expect("mac set deveui 0004a30b001a55ed", &["invalid_param"]);

        let (mut radio, _log) = driver(mock).await;
        let err = radio.config_otaa(&otaa_creds()).await.unwrap_err();
        assert!(matches!(err, Error::Reception(_)));
        assert_eq!(radio.wan_mode(), WanMode::None);
    }

    // -------------------------------------------------------------------
    // Join
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn join_accepted_after_blank_lines() {
        let mut mock = configured_mock();
        expect_otaa_config(&mut mock);
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac join otaa", &["ok", "", "", "accepted"]);

        let (mut radio, _log) = driver(mock).await;
        radio.config_otaa(&otaa_creds()).await.unwrap();
        radio.join().await.unwrap();
    }

    #[tokio::test]
    async fn join_denied_carries_reply_text() {
        let mut mock = configured_mock();
        expect_otaa_config(&mut mock);
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac join otaa", &["ok", "denied"]);

        let (mut radio, _log) = driver(mock).await;
        radio.config_otaa(&otaa_creds()).await.unwrap();

        let err = radio.join().await.unwrap_err();
        assert!(err.to_string().contains("denied"));
        match err {
            Error::Join(reply) => assert_eq!(reply, "denied"),
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_abp_uses_abp_mode_argument() {
        let mut mock = configured_mock();
        mock.expect("mac set adr on", &["ok"]);
        mock.expect("mac set nwkskey 101112131415161718191a1b1c1d1e1f", &["ok"]);
        mock.expect("mac set appskey 202122232425262728292a2b2c2d2e2f", &["ok"]);
        mock.expect("mac set devaddr 26011cf4", &["ok"]);
        mock.expect("mac save", &["ok"]);
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac join abp", &["ok", "accepted"]);

        let (mut radio, log) = driver(mock).await;
        radio.config_abp(&abp_creds()).await.unwrap();
        radio.join().await.unwrap();

        assert!(log.lines().contains(&"mac join abp".to_string()));
    }

    #[tokio::test]
    async fn join_without_provisioning_writes_nothing() {
        let mock = configured_mock();
        let (mut radio, log) = driver(mock).await;

        let before = log.lines().len();
        let err = radio.join().await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(log.lines().len(), before);
    }

    #[tokio::test]
    async fn join_after_close_not_connected() {
        let mut mock = configured_mock();
        expect_otaa_config(&mut mock);

        let (mut radio, _log) = driver(mock).await;
        radio.config_otaa(&otaa_creds()).await.unwrap();
        radio.close().await.unwrap();

        let err = radio.join().await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn join_verdict_timeout_propagates() {
        let mut mock = configured_mock();
        expect_otaa_config(&mut mock);
        mock.expect("mac resume", &["ok"]);
        // `ok` arrives, the verdict never does.
        mock.expect("mac join otaa", &["ok"]);

        let (mut radio, _log) = driver(mock).await;
        radio.config_otaa(&otaa_creds()).await.unwrap();

        let err = radio.join().await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    // -------------------------------------------------------------------
    // Uplink
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn uplink_happy_path_pauses_once() {
        let mut mock = configured_mock();
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac tx uncnf 4 4869", &["ok", "", "mac_tx_ok"]);
        mock.expect("mac pause", &["4294967245"]);

        let (mut radio, log) = driver(mock).await;
        radio.send_uplink("4869").await.unwrap();

        assert_eq!(log.count_of("mac pause"), 1);
        assert_eq!(log.lines().last().map(String::as_str), Some("mac pause"));
    }

    #[tokio::test]
    async fn uplink_rejection_carries_reply_and_pauses() {
        let mut mock = configured_mock();
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac tx uncnf 4 4869", &["ok", "invalid_data_len"]);
        mock.expect("mac pause", &["ok"]);

        let (mut radio, log) = driver(mock).await;
        let err = radio.send_uplink("4869").await.unwrap_err();
        match err {
            Error::Transmission(reply) => assert_eq!(reply, "invalid_data_len"),
            other => panic!("expected Transmission, got {other:?}"),
        }
        assert_eq!(log.count_of("mac pause"), 1);
    }

    #[tokio::test]
    async fn uplink_confirmation_timeout_still_pauses() {
        let mut mock = configured_mock();
        mock.expect("mac resume", &["ok"]);
        // Confirmation never arrives.
        mock.expect("mac tx uncnf 4 4869", &["ok"]);
        mock.expect("mac pause", &["ok"]);

        let (mut radio, log) = driver(mock).await;
        let err = radio.send_uplink("4869").await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(log.count_of("mac pause"), 1);
    }

    #[tokio::test]
    async fn uplink_tx_rejection_still_pauses() {
        let mut mock = configured_mock();
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac tx uncnf 4 4869", &["not_joined"]);
        mock.expect("mac pause", &["ok"]);

        let (mut radio, log) = driver(mock).await;
        let err = radio.send_uplink("4869").await.unwrap_err();
        assert!(matches!(err, Error::Reception(_)));
        assert_eq!(log.count_of("mac pause"), 1);
    }

    #[tokio::test]
    async fn uplink_resume_failure_skips_pause() {
        let mut mock = configured_mock();
        mock.expect_short_write("mac resume", 0);

        let (mut radio, log) = driver(mock).await;
        let err = radio.send_uplink("4869").await.unwrap_err();
        assert!(matches!(err, Error::Transmission(_)));
        // The exchange never started, so there is nothing to pause.
        assert_eq!(log.count_of("mac pause"), 0);
    }

    #[tokio::test]
    async fn uplink_confirmed_on_custom_port() {
        let mut mock = configured_mock();
        mock.expect("mac resume", &["ok"]);
        mock.expect("mac tx cnf 12 deadbeef", &["ok", "mac_tx_ok"]);
        mock.expect("mac pause", &["ok"]);

        let (mut radio, _log) = driver(mock).await;
        radio
            .send_uplink_on("deadbeef", UplinkKind::Confirmed, 12)
            .await
            .unwrap();
    }

    // -------------------------------------------------------------------
    // Display forms
    // -------------------------------------------------------------------

    #[test]
    fn wan_mode_display() {
        assert_eq!(WanMode::None.to_string(), "none");
        assert_eq!(WanMode::Otaa.to_string(), "otaa");
        assert_eq!(WanMode::Abp.to_string(), "abp");
    }

    #[test]
    fn uplink_kind_display() {
        assert_eq!(UplinkKind::Unconfirmed.to_string(), "uncnf");
        assert_eq!(UplinkKind::Confirmed.to_string(), "cnf");
    }
}
