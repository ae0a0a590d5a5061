//! Sealed envelope wire format.
//!
//! ```text
//! ESEC[<version>:<base64 sender public key>:<base64 nonce>:<base64 ciphertext>]
//! ```
//!
//! Fields use the standard padded base64 alphabet. Decoding is strict: any
//! framing, version, alphabet, padding, or length deviation is rejected, and
//! [`Envelope::is_sealed`] accepts exactly the inputs [`Envelope::decode`] does.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::trace;

use super::keys::KEY_SIZE;
use crate::core::constants::{ENVELOPE_PREFIX, ENVELOPE_VERSION, SUPPORTED_VERSIONS};
use crate::error::{EnvelopeError, Result};

/// Size of the box nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// A sealed payload plus everything needed to open it with the recipient key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u8,
    /// Ephemeral sender public key, never tied to a persisted identity.
    pub sender_public: [u8; KEY_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Build a current-version envelope.
    pub fn new(sender_public: [u8; KEY_SIZE], nonce: [u8; NONCE_SIZE], ciphertext: Vec<u8>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            sender_public,
            nonce,
            ciphertext,
        }
    }

    /// Encode to the wire string.
    pub fn encode(&self) -> String {
        format!(
            "{}[{}:{}:{}:{}]",
            ENVELOPE_PREFIX,
            self.version,
            STANDARD.encode(self.sender_public),
            STANDARD.encode(self.nonce),
            STANDARD.encode(&self.ciphertext),
        )
    }

    /// Decode a wire string.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Malformed` describing the first violation found.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let envelope = parse(wire).map_err(|e| {
            trace!(error = %e, "envelope rejected");
            e
        })?;
        Ok(envelope)
    }

    /// Whether `bytes` is a well-formed envelope.
    ///
    /// Used to tell sealed values from plaintext without opening them.
    pub fn is_sealed(bytes: &[u8]) -> bool {
        if !has_framing(bytes) {
            return false;
        }
        parse(bytes).is_ok()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Envelope {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s.as_bytes())
    }
}

fn has_framing(bytes: &[u8]) -> bool {
    bytes.len() > ENVELOPE_PREFIX.len() + 1
        && bytes.starts_with(ENVELOPE_PREFIX.as_bytes())
        && bytes[ENVELOPE_PREFIX.len()] == b'['
        && bytes.ends_with(b"]")
}

fn parse(wire: &[u8]) -> std::result::Result<Envelope, EnvelopeError> {
    if !has_framing(wire) {
        return Err(EnvelopeError::malformed(format!(
            "missing {}[...] framing",
            ENVELOPE_PREFIX
        )));
    }

    let body = &wire[ENVELOPE_PREFIX.len() + 1..wire.len() - 1];
    let body =
        std::str::from_utf8(body).map_err(|_| EnvelopeError::malformed("body is not valid utf-8"))?;

    let fields: Vec<&str> = body.split(':').collect();
    if fields.len() != 4 {
        return Err(EnvelopeError::malformed(format!(
            "expected 4 fields, found {}",
            fields.len()
        )));
    }

    let version = parse_version(fields[0])?;
    let sender_public = decode_fixed::<KEY_SIZE>(fields[1], "sender public key")?;
    let nonce = decode_fixed::<NONCE_SIZE>(fields[2], "nonce")?;
    let ciphertext = STANDARD
        .decode(fields[3])
        .map_err(|_| EnvelopeError::malformed("ciphertext is not valid base64"))?;

    Ok(Envelope {
        version,
        sender_public,
        nonce,
        ciphertext,
    })
}

fn parse_version(field: &str) -> std::result::Result<u8, EnvelopeError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EnvelopeError::malformed("version is not a decimal integer"));
    }
    if field.len() > 1 && field.starts_with('0') {
        return Err(EnvelopeError::malformed("version has leading zeros"));
    }
    let version: u8 = field
        .parse()
        .map_err(|_| EnvelopeError::malformed("version out of range"))?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(EnvelopeError::malformed(format!(
            "unsupported version {}",
            version
        )));
    }
    Ok(version)
}

fn decode_fixed<const N: usize>(
    field: &str,
    what: &str,
) -> std::result::Result<[u8; N], EnvelopeError> {
    let bytes = STANDARD
        .decode(field)
        .map_err(|_| EnvelopeError::malformed(format!("{} is not valid base64", what)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        EnvelopeError::malformed(format!(
            "{} must be {} bytes, got {}",
            what,
            N,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR: &str = "ESEC[1:AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=:AgICAgICAgICAgICAgICAgICAgICAgIC:AwMD]";

    fn vector_envelope() -> Envelope {
        Envelope::new([0x01; KEY_SIZE], [0x02; NONCE_SIZE], vec![0x03, 0x03, 0x03])
    }

    #[test]
    fn test_encode_literal_vector() {
        assert_eq!(vector_envelope().encode(), VECTOR);
    }

    #[test]
    fn test_decode_literal_vector() {
        let envelope = Envelope::decode(VECTOR.as_bytes()).unwrap();
        assert_eq!(envelope, vector_envelope());
        assert!(Envelope::is_sealed(VECTOR.as_bytes()));
    }

    #[test]
    fn test_from_str_and_display() {
        let envelope: Envelope = VECTOR.parse().unwrap();
        assert_eq!(envelope.to_string(), VECTOR);
    }

    #[test]
    fn test_rejects_missing_framing() {
        for input in ["", "ESEC", "ESEC[]", "EJ[1:a:b:c]", "plain value", "ESEC[1:a:b:c"] {
            assert!(Envelope::decode(input.as_bytes()).is_err(), "{input}");
            assert!(!Envelope::is_sealed(input.as_bytes()), "{input}");
        }
    }

    #[test]
    fn test_rejects_wrong_field_count() {
        let three = "ESEC[1:AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=:AgICAgICAgICAgICAgICAgICAgICAgIC]";
        let five = format!("{}:AwMD]", &VECTOR[..VECTOR.len() - 1]);
        assert!(Envelope::decode(three.as_bytes()).is_err());
        assert!(Envelope::decode(five.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_bad_version() {
        for version in ["", "x", "-1", "+1", "01", "2", "256", " 1"] {
            let wire = VECTOR.replacen("[1:", &format!("[{}:", version), 1);
            assert!(Envelope::decode(wire.as_bytes()).is_err(), "{version}");
        }
    }

    #[test]
    fn test_rejects_wrong_key_and_nonce_lengths() {
        let short_key = STANDARD.encode([1u8; 31]);
        let long_nonce = STANDARD.encode([2u8; 25]);
        let wire = format!("ESEC[1:{}:{}:AwMD]", short_key, STANDARD.encode([2u8; 24]));
        assert!(Envelope::decode(wire.as_bytes()).is_err());
        let wire = format!("ESEC[1:{}:{}:AwMD]", STANDARD.encode([1u8; 32]), long_nonce);
        assert!(Envelope::decode(wire.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_url_safe_and_unpadded_base64() {
        let unpadded = VECTOR.replace("AQE=:", "AQE:");
        assert!(Envelope::decode(unpadded.as_bytes()).is_err());
        let url_safe = VECTOR.replace("AwMD]", "Aw-_]");
        assert!(Envelope::decode(url_safe.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_ciphertext_field_decodes() {
        let wire = VECTOR.replace(":AwMD]", ":]");
        let envelope = Envelope::decode(wire.as_bytes()).unwrap();
        assert!(envelope.ciphertext.is_empty());
    }
}
