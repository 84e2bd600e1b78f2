//! Transport encoding for audio payloads (standard base64)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// Decode a standard-alphabet, `=`-padded base64 string into raw bytes
///
/// # Errors
///
/// Returns `MalformedPayload` if the input contains characters outside the
/// alphabet or has invalid padding or length
pub fn decode_transport_encoding(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| Error::MalformedPayload(e.to_string()))
}

/// Encode raw bytes as standard base64
#[must_use]
pub fn encode_transport_encoding(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
