//! Key types.
//!
//! Curve25519 public/private keys as raw 32-byte values. Public keys render
//! as hex; private keys accept hex or base64 and never print themselves.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{KeyError, Result};

/// Size of both public and private keys in bytes.
pub const KEY_SIZE: usize = 32;

/// A recipient public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Parse a public key from 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidPublicKey` if the input is not 32 bytes of hex.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(hex.trim(), &mut bytes)
            .map_err(|_| KeyError::InvalidPublicKey(hex.to_string()))?;
        Ok(Self(bytes))
    }

    /// Lower-case hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short SHA-256 fingerprint, safe for logs and listings.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl FromStr for PublicKey {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let mut bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(value.trim(), &mut bytes)
            .map_err(|_| KeyError::InvalidPublicKey(value.clone()))?;
        Ok(Self(bytes))
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_hex()
    }
}

/// A private key. Zeroed on drop; `Debug` is redacted.
#[derive(Clone)]
pub struct PrivateKey(Zeroizing<[u8; KEY_SIZE]>);

impl PrivateKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Decode a private key held in the variable `name`.
    ///
    /// Exactly 64 hex characters are read as hex; anything else must be
    /// padded base64 of 32 bytes. Errors name the variable, never the value.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidFormat` if neither encoding yields 32 bytes.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);

        if value.len() == KEY_SIZE * 2 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode_to_slice(value, &mut bytes[..])
                .map_err(|_| KeyError::InvalidFormat(name.to_string()))?;
            return Ok(Self(bytes));
        }

        let decoded = Zeroizing::new(
            STANDARD
                .decode(value)
                .map_err(|_| KeyError::InvalidFormat(name.to_string()))?,
        );
        if decoded.len() != KEY_SIZE {
            return Err(KeyError::InvalidFormat(name.to_string()).into());
        }
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Lower-case hex encoding, for writing keyring entries.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0[..]))
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = crypto_box::SecretKey::from(*self.0);
        PublicKey(*secret.public_key().as_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A public/private key pair for one identity.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        let secret = crypto_box::SecretKey::generate(&mut OsRng);
        let public = PublicKey(*secret.public_key().as_bytes());
        Self {
            public,
            private: PrivateKey::from_bytes(secret.to_bytes()),
        }
    }
}
