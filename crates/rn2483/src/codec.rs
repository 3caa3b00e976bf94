//! Hex payload codec.
//!
//! The module carries payloads on the wire as hex-encoded ASCII. This is the
//! boundary between the text strings callers hand to `send_str`/`recv_str`
//! and the hex the radio commands expect. Decode failures are reception
//! errors: a received payload of odd length is corrupted and is never
//! silently truncated.

use rn2483_core::error::{Error, Result};

/// Hex-encode a text payload for a `radio tx` command.
///
/// # Example
///
/// ```
/// use rn2483::codec::encode_payload;
///
/// assert_eq!(encode_payload("Hi"), "4869");
/// ```
pub fn encode_payload(text: &str) -> String {
    hex::encode(text.as_bytes())
}

/// Decode a received hex payload back to text.
///
/// Fails with [`Error::Reception`] when the hex has odd length (a corrupted
/// reception) or when the decoded bytes are not valid UTF-8.
///
/// # Example
///
/// ```
/// use rn2483::codec::decode_payload;
///
/// assert_eq!(decode_payload("4869").unwrap(), "Hi");
/// assert!(decode_payload("486").is_err());
/// ```
pub fn decode_payload(payload: &str) -> Result<String> {
    let bytes = hex::decode(payload).map_err(|e| match e {
        hex::FromHexError::OddLength => {
            Error::Reception("received data has odd length".into())
        }
        other => Error::Reception(format!("received data is not valid hex: {other}")),
    })?;

    String::from_utf8(bytes)
        .map_err(|_| Error::Reception("received data is not valid UTF-8".into()))
}
