//! Initial radio configuration sequence.
//!
//! Run once, during connection establishment. Every command in the fixed
//! list must come back `ok` before the module is considered usable; a single
//! rejection or stall anywhere aborts construction, so a half-configured
//! module is never handed to the caller.

use tracing::{debug, info};

use rn2483_core::error::{Error, Result};

use crate::channel::CommandChannel;
use crate::protocol;

/// The fixed radio setup, in required order. 868 MHz, SF12, 250 kHz
/// bandwidth, CRC on, coding rate 4/8, sync word 0x12. The watchdog is
/// disabled here and re-armed afterwards when a timeout was requested.
pub const RADIO_SETUP: [&str; 13] = [
    "radio set mod lora",
    "radio set freq 868000000",
    "radio set pwr 14",
    "radio set sf sf12",
    "radio set afcbw 125",
    "radio set rxbw 250",
    "radio set fdev 5000",
    "radio set prlen 8",
    "radio set crc on",
    "radio set cr 4/8",
    "radio set wdt 0",
    "radio set sync 12",
    "radio set bw 250",
];

/// Apply the full radio configuration, then arm the receive watchdog when
/// `watchdog_ms` is non-zero.
///
/// Any failure -- rejection, mismatched reply, timeout -- surfaces as
/// [`Error::Configuration`] naming the offending command.
pub(crate) async fn apply_radio_config(
    channel: &mut CommandChannel,
    watchdog_ms: u64,
) -> Result<()> {
    for cmd in RADIO_SETUP {
        confirm(channel, cmd).await?;
    }

    if watchdog_ms > 0 {
        let cmd = format!("radio set wdt {watchdog_ms}");
        confirm(channel, &cmd).await?;
        debug!(watchdog_ms, "receive watchdog armed");
    }

    info!("module configuration completed");
    Ok(())
}

async fn confirm(channel: &mut CommandChannel, cmd: &str) -> Result<()> {
    channel
        .execute(cmd, Some(protocol::OK))
        .await
        .map_err(|e| {
            Error::Configuration(format!("initial configuration failed at `{cmd}`: {e}"))
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::LogTrace;
    use rn2483_test_harness::MockLineTransport;
    use std::time::Duration;

    fn channel(mock: MockLineTransport) -> CommandChannel {
        CommandChannel::new(
            Box::new(mock),
            Duration::from_millis(100),
            false,
            Box::new(LogTrace),
        )
    }

    fn mock_with_full_setup() -> MockLineTransport {
        let mut mock = MockLineTransport::new();
        for cmd in RADIO_SETUP {
            mock.expect(cmd, &["ok"]);
        }
        mock
    }

    #[tokio::test]
    async fn full_sequence_in_order() {
        let mock = mock_with_full_setup();
        let log = mock.log_handle();

        let mut ch = channel(mock);
        apply_radio_config(&mut ch, 0).await.unwrap();

        assert_eq!(log.lines(), RADIO_SETUP.to_vec());
    }

    #[tokio::test]
    async fn watchdog_armed_when_requested() {
        let mut mock = mock_with_full_setup();
        mock.expect("radio set wdt 2000", &["ok"]);
        let log = mock.log_handle();

        let mut ch = channel(mock);
        apply_radio_config(&mut ch, 2000).await.unwrap();

        assert_eq!(log.lines().last().map(String::as_str), Some("radio set wdt 2000"));
        // The disable command earlier in the fixed list is still issued.
        assert_eq!(log.count_of("radio set wdt 0"), 1);
    }

    #[tokio::test]
    async fn watchdog_skipped_when_zero() {
        let mock = mock_with_full_setup();
        let log = mock.log_handle();

        let mut ch = channel(mock);
        apply_radio_config(&mut ch, 0).await.unwrap();

        assert_eq!(log.lines().len(), RADIO_SETUP.len());
    }

    #[tokio::test]
    async fn rejection_aborts_with_configuration_error() {
        let mut mock = MockLineTransport::new();
        mock.expect("radio set mod lora", &["ok"]);
        mock.expect("radio set freq 868000000", &["invalid_param"]);
        let log = mock.log_handle();

        let mut ch = channel(mock);
        let err = apply_radio_config(&mut ch, 0).await.unwrap_err();
        match err {
            Error::Configuration(msg) => {
                assert!(msg.contains("radio set freq 868000000"));
            }
            other => panic!("expected Configuration, got {other:?}"),
        }

        // Fail fast: nothing after the rejected command was issued.
        assert_eq!(log.lines().len(), 2);
    }

    #[tokio::test]
    async fn stall_aborts_with_configuration_error() {
        let mut mock = MockLineTransport::new();
        mock.expect("radio set mod lora", &[]);

        let mut ch = channel(mock);
        let err = apply_radio_config(&mut ch, 0).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
