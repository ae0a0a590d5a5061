//! Cryptographic operations.
//!
//! Provides the envelope wire format, key types, and the sealed-box backend.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use crate::error::Result;

pub mod envelope;
pub mod keys;
mod sealed;

pub use envelope::Envelope;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use sealed::SealedBox;

/// Cryptographic backend trait.
///
/// Abstracts string-level encryption so vault and distribution code does not
/// depend on a concrete construction.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt plaintext for a single recipient.
    ///
    /// # Returns
    ///
    /// Encrypted string (format depends on backend implementation).
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails.
    fn encrypt(&self, plaintext: &str, recipient: &Self::Recipient) -> Result<String>;

    /// Decrypt an encrypted string using a private identity.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError` for malformed input and `CipherError` if
    /// decryption fails.
    fn decrypt(&self, encrypted: &str, identity: &Self::Identity) -> Result<String>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// Seal a string for one recipient and return the wire form.
///
/// Convenience wrapper around `SealedBox::encrypt`.
pub fn encrypt(plaintext: &str, recipient: &PublicKey) -> Result<String> {
    SealedBox.encrypt(plaintext, recipient)
}

/// Open a wire-form envelope with a private key.
///
/// Convenience wrapper around `SealedBox::decrypt`.
pub fn decrypt(encrypted: &str, key: &PrivateKey) -> Result<String> {
    SealedBox.decrypt(encrypted, key)
}

/// Whether a stored value is a sealed envelope rather than plaintext.
pub fn is_sealed(value: &str) -> bool {
    Envelope::is_sealed(value.as_bytes())
}
