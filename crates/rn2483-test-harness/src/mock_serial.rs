//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockLineTransport`] implements the [`LineTransport`] trait with
//! pre-loaded command/reply-line pairs. This lets you test command framing,
//! reply classification, and the join/uplink handshakes without a module on
//! the bench.
//!
//! # Example
//!
//! ```
//! use rn2483_test_harness::MockLineTransport;
//!
//! let mut mock = MockLineTransport::new();
//! // Pre-load: when the driver sends this command, return these lines.
//! mock.expect("radio tx 4869", &["ok", "radio_tx_ok"]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rn2483_core::error::{Error, Result};
use rn2483_core::transport::LineTransport;

/// A pre-loaded command/reply pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact command line we expect to be written (without `\r\n`).
    command: String,
    /// Lines to queue for subsequent `read_line()` calls.
    replies: Vec<String>,
    /// When set, the write reports this many bytes accepted and queues no
    /// replies: `0` models a write timeout, a short count a partial write.
    write_result: Option<usize>,
}

/// A shared, cloneable view of every line written through a mock transport.
///
/// Obtained from [`MockLineTransport::log_handle`] *before* the mock is boxed
/// and moved into the driver, so tests can assert on the wire traffic after
/// the exchange completes.
#[derive(Debug, Clone, Default)]
pub struct SentLog(Arc<Mutex<Vec<String>>>);

impl SentLog {
    /// All command lines written so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// How many times the exact line `cmd` was written.
    pub fn count_of(&self, cmd: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|l| *l == cmd).count()
    }

    fn push(&self, line: String) {
        self.0.lock().unwrap().push(line);
    }
}

/// A mock [`LineTransport`] for testing the driver without hardware.
///
/// Expectations are consumed in order. When `write()` is called, the command
/// line is recorded and matched against the next expectation; that
/// expectation's reply lines are then returned one per `read_line()` call.
/// When the reply queue is empty, `read_line()` fails with
/// [`Error::Timeout`], which is exactly what a silent module looks like.
///
/// A write with no matching expectation is an error: the test scripted a
/// different conversation than the driver held.
#[derive(Debug)]
pub struct MockLineTransport {
    /// Ordered queue of expected command/reply pairs.
    expectations: VecDeque<Expectation>,
    /// Reply lines pending for `read_line()`.
    pending: VecDeque<String>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of every command line written through this transport.
    sent_log: SentLog,
}

impl MockLineTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockLineTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            connected: true,
            sent_log: SentLog::default(),
        }
    }

    /// Add an expected command with the reply lines it produces.
    ///
    /// `command` is matched against the written line with the `\r\n`
    /// terminator stripped. An empty `replies` slice models a module that
    /// accepts the command but never answers (the next read times out).
    pub fn expect(&mut self, command: &str, replies: &[&str]) {
        self.expectations.push_back(Expectation {
            command: command.to_string(),
            replies: replies.iter().map(|s| s.to_string()).collect(),
            write_result: None,
        });
    }

    /// Expect `command`, but report only `n` bytes accepted by the write.
    ///
    /// Use `0` to model a write timeout and a short count to model a
    /// partial write. No reply lines are queued either way.
    pub fn expect_short_write(&mut self, command: &str, n: usize) {
        self.expectations.push_back(Expectation {
            command: command.to_string(),
            replies: Vec::new(),
            write_result: Some(n),
        });
    }

    /// Queue an unsolicited line, delivered before any expectation replies.
    pub fn push_line(&mut self, line: &str) {
        self.pending.push_back(line.to_string());
    }

    /// A cloneable handle onto the sent-line log.
    ///
    /// Clone this before moving the mock into the driver.
    pub fn log_handle(&self) -> SentLog {
        self.sent_log.clone()
    }

    /// All command lines written so far.
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent_log.lines()
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockLineTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineTransport for MockLineTransport {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let line = String::from_utf8_lossy(data);
        let line = line.trim_end_matches(['\r', '\n']).to_string();

        // Record what was sent, including failed writes.
        self.sent_log.push(line.clone());

        // Match against the next expectation.
        if let Some(expectation) = self.expectations.pop_front() {
            if line != expectation.command {
                return Err(Error::Reception(format!(
                    "unexpected command: expected `{}`, got `{}`",
                    expectation.command, line
                )));
            }
            if let Some(n) = expectation.write_result {
                return Ok(n);
            }
            self.pending.extend(expectation.replies);
            Ok(data.len())
        } else {
            Err(Error::Reception(format!(
                "no more expectations in mock transport (got `{}`)",
                line
            )))
        }
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<String> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.pending.pop_front().ok_or(Error::Timeout)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
