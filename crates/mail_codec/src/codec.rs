//! URL-safe base64 text codec.
//!
//! Encoding strips the `=` padding; decoding accepts input with or without it,
//! and also tolerates the standard `+`/`/` alphabet since some providers
//! return either form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Errors from decoding a transport token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid base64: {0}")]
    Base64(String),

    #[error("Invalid UTF-8: {0}")]
    Utf8(String),
}

/// Encode raw bytes into an unpadded URL-safe token
pub fn encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Encode text as its UTF-8 bytes
pub fn encode(text: &str) -> String {
    encode_bytes(text.as_bytes())
}

/// Decode a token back into raw bytes
pub fn decode_bytes(token: &str) -> Result<Vec<u8>, DecodeError> {
    let normalized: String = token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

/// Decode a token back into UTF-8 text
pub fn decode(token: &str) -> Result<String, DecodeError> {
    let bytes = decode_bytes(token)?;
    String::from_utf8(bytes).map_err(|e| DecodeError::Utf8(e.to_string()))
}
