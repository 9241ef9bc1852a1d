//! Utility functions for the enclave KMS library

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::buffer::SecureBuffer;
use crate::error::{Error, Result};

/// Encodes secret bytes to base64.
///
/// The encoded text lives in a [`SecureBuffer`] like the source bytes: a
/// base64 rendering of a secret is still a secret.
pub fn encode_b64(text: &SecureBuffer) -> SecureBuffer {
    let encoded = STANDARD.encode(text.as_slice());
    SecureBuffer::from_vec(encoded.into_bytes())
}

/// Decodes base64 text into secret bytes.
///
/// # Errors
///
/// `InvalidParameter` if the input is not valid base64.
pub fn decode_b64(text_b64: &str) -> Result<SecureBuffer> {
    let decoded = STANDARD
        .decode(text_b64)
        .map_err(|e| Error::InvalidParameter(format!("not a base64 string: {}", e)))?;

    Ok(SecureBuffer::from_vec(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let secret = SecureBuffer::from_slice(b"key material");
        let encoded = encode_b64(&secret);

        let encoded_str =
            std::str::from_utf8(encoded.as_slice()).expect("base64 output is ascii");
        let decoded = decode_b64(encoded_str).expect("decode failed");

        assert_eq!(decoded.as_slice(), b"key material");
    }

    #[test]
    fn test_decode_rejects_invalid_input() {
        let result = decode_b64("not base64!!!");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
