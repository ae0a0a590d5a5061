//! Sealed-box backend.
//!
//! Curve25519 key agreement between a fresh ephemeral key and the recipient,
//! then XSalsa20-Poly1305 over the payload (NaCl `box`). Only the recipient's
//! private key is needed to open a message.

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::{Aead, AeadCore, OsRng};
use crypto_box::SalsaBox;
use tracing::trace;

use super::envelope::{Envelope, NONCE_SIZE};
use super::keys::{PrivateKey, PublicKey};
use super::Cipher;
use crate::error::{CipherError, Result};

/// Sealed-box engine producing [`Envelope`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SealedBox;

impl SealedBox {
    /// Seal `plaintext` for `recipient`.
    ///
    /// Every call uses a new ephemeral key pair and nonce.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if the AEAD rejects the input.
    pub fn seal(&self, plaintext: &[u8], recipient: &PublicKey) -> Result<Envelope> {
        let ephemeral = crypto_box::SecretKey::generate(&mut OsRng);
        let recipient_key = crypto_box::PublicKey::from(*recipient.as_bytes());
        let salsa = SalsaBox::new(&recipient_key, &ephemeral);

        let nonce = SalsaBox::generate_nonce(&mut OsRng);
        let ciphertext = salsa
            .encrypt(&nonce, plaintext)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&nonce);

        trace!(
            recipient = %recipient.fingerprint(),
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "sealed"
        );

        Ok(Envelope::new(
            *ephemeral.public_key().as_bytes(),
            nonce_bytes,
            ciphertext,
        ))
    }

    /// Open an envelope with the recipient's private key.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` for any authentication failure,
    /// without saying whether the key or the data was wrong.
    pub fn open(&self, envelope: &Envelope, key: &PrivateKey) -> Result<Vec<u8>> {
        let sender = crypto_box::PublicKey::from(envelope.sender_public);
        let secret = crypto_box::SecretKey::from(*key.as_bytes());
        let salsa = SalsaBox::new(&sender, &secret);

        let nonce = GenericArray::from_slice(&envelope.nonce);
        let plaintext = salsa
            .decrypt(nonce, envelope.ciphertext.as_slice())
            .map_err(|_| CipherError::DecryptionFailed)?;

        trace!(plaintext_len = plaintext.len(), "opened");
        Ok(plaintext)
    }
}

impl Cipher for SealedBox {
    type Recipient = PublicKey;
    type Identity = PrivateKey;

    fn name(&self) -> &'static str {
        "sealed-box"
    }

    fn encrypt(&self, plaintext: &str, recipient: &PublicKey) -> Result<String> {
        Ok(self.seal(plaintext.as_bytes(), recipient)?.encode())
    }

    fn decrypt(&self, encrypted: &str, identity: &PrivateKey) -> Result<String> {
        let envelope = Envelope::decode(encrypted.as_bytes())?;
        let plaintext = self.open(&envelope, identity)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed.into())
    }
}
