//! RN2483 AT-command wire grammar.
//!
//! The RN2483 command protocol is line-oriented ASCII over a serial link.
//! Commands are space-separated words terminated with `\r\n`; the module
//! answers each command with exactly one status/data line. Some operations
//! (transmit confirmation, join verdict, received packets) produce a second,
//! asynchronous line later.
//!
//! # Command format
//!
//! ```text
//! <group> <verb> [<param> [<value>]]\r\n
//! ```
//!
//! - `group`: `radio`, `mac`, or `sys`.
//! - Everything is case-sensitive lowercase ASCII.
//!
//! # Status tokens
//!
//! | Token         | Meaning                                            |
//! |---------------|----------------------------------------------------|
//! | `ok`          | Command accepted                                   |
//! | `busy`        | Module busy; benign only after `radio rx`          |
//! | `radio_err`   | Receive watchdog fired (treated as a timeout)      |
//! | `radio_tx_ok` | Radio-level transmit completed                     |
//! | `mac_tx_ok`   | LoRaWAN uplink acknowledged by the MAC layer       |
//! | `accepted`    | LoRaWAN join accepted                              |

use bytes::{BufMut, BytesMut};

/// Command accepted.
pub const OK: &str = "ok";

/// Module is busy. Benign only as a reply to a `radio rx` command, where it
/// means the receiver is already armed.
pub const BUSY: &str = "busy";

/// Receive watchdog fired before a packet arrived.
pub const RADIO_ERR: &str = "radio_err";

/// Radio-level transmit completed on air.
pub const RADIO_TX_OK: &str = "radio_tx_ok";

/// LoRaWAN uplink completed.
pub const MAC_TX_OK: &str = "mac_tx_ok";

/// LoRaWAN join accepted by the network.
pub const ACCEPTED: &str = "accepted";

/// Command terminator.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Length of the `radio_rx` metadata prefix on a received-packet line.
/// Everything after it (whitespace-trimmed) is the hex payload.
const RX_METADATA_LEN: usize = 8;

/// Frame a command for transmission: the command text plus `\r\n`.
///
/// # Example
///
/// ```
/// use rn2483::protocol::frame_command;
///
/// assert_eq!(frame_command("mac pause"), b"mac pause\r\n");
/// ```
pub fn frame_command(cmd: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(cmd.len() + TERMINATOR.len());
    buf.put_slice(cmd.as_bytes());
    buf.put_slice(TERMINATOR);
    buf.to_vec()
}

/// Whether `cmd` arms the receiver.
///
/// Used for the one tolerated reply mismatch: a `busy` answer to a receive
/// command means the module is already receiving, which callers that re-arm
/// the receiver in a loop must not see as an error. The check is the literal
/// `radio rx ` prefix; it deliberately does not extend to any other command.
pub fn is_receive_command(cmd: &str) -> bool {
    cmd.starts_with("radio rx ")
}

/// Strip the `radio_rx` metadata prefix from a received-packet line,
/// returning the whitespace-trimmed hex payload.
///
/// Returns `None` when the line is too short to carry the prefix.
///
/// # Example
///
/// ```
/// use rn2483::protocol::strip_rx_metadata;
///
/// assert_eq!(strip_rx_metadata("radio_rx  4869"), Some("4869"));
/// assert_eq!(strip_rx_metadata("ok"), None);
/// ```
pub fn strip_rx_metadata(line: &str) -> Option<&str> {
    line.get(RX_METADATA_LEN..).map(str::trim)
}
