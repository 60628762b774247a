//! Sealing a small payload to a recipient with ECDH + AES Key Wrap.
//!
//! To hand a secret to another user, the sender:
//! 1. generates an ephemeral X25519 keypair,
//! 2. performs ECDH between the ephemeral secret and the recipient's
//!    published encryption key,
//! 3. wraps the payload under the shared secret with AES-KW (RFC 3394),
//! 4. signs `ephemeral_pubkey || wrapped` with their Ed25519 key.
//!
//! The recipient verifies the signature against the sender's published
//! verify key *before* attempting recovery, then repeats the ECDH with
//! their private key and unwraps. AES-KW authenticates the wrapped bytes,
//! so a share addressed to someone else (or corrupted in transit) fails to
//! unwrap rather than producing garbage.

use serde::{Deserialize, Serialize};

use super::keys::{EncryptionKey, EncryptionPublicKey, KeyError, SigningKey, VerifyKey, KEY_SIZE};

use aes_kw::KekAes256 as Kek;

/// Size of a wrapped payload: AES-KW adds an 8-byte integrity block.
pub const WRAPPED_SIZE: usize = SHARE_PAYLOAD_SIZE + 8;

/// Size of the payload a share carries.
pub const SHARE_PAYLOAD_SIZE: usize = 32;

/// Errors from share creation and recovery.
#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("payload wrapping failed")]
    Wrap,
    #[error("payload unwrapping failed")]
    Unwrap,
    #[error("malformed share")]
    Malformed,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// A payload wrapped for one specific recipient.
///
/// Only the holder of the matching private encryption key can recover the
/// payload; everyone else (including the sender, once the ephemeral secret
/// is dropped) sees 72 opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretShare {
    ephemeral: [u8; KEY_SIZE],
    wrapped: Vec<u8>,
}

impl SecretShare {
    /// Wrap `payload` for `recipient`.
    pub fn new(
        payload: &[u8; SHARE_PAYLOAD_SIZE],
        recipient: &EncryptionPublicKey,
    ) -> Result<Self, SecretShareError> {
        let ephemeral = EncryptionKey::generate();
        let shared = ephemeral.agree(recipient);

        let kek = Kek::from(shared);
        let wrapped = kek.wrap_vec(payload).map_err(|_| SecretShareError::Wrap)?;

        Ok(Self {
            ephemeral: ephemeral.public().to_bytes(),
            wrapped,
        })
    }

    /// Recover the payload with the recipient's private key.
    pub fn recover(
        &self,
        recipient: &EncryptionKey,
    ) -> Result<[u8; SHARE_PAYLOAD_SIZE], SecretShareError> {
        if self.wrapped.len() != WRAPPED_SIZE {
            return Err(SecretShareError::Malformed);
        }

        let ephemeral = EncryptionPublicKey::from_slice(&self.ephemeral)?;
        let shared = recipient.agree(&ephemeral);

        let kek = Kek::from(shared);
        let unwrapped = kek
            .unwrap_vec(&self.wrapped)
            .map_err(|_| SecretShareError::Unwrap)?;

        if unwrapped.len() != SHARE_PAYLOAD_SIZE {
            return Err(SecretShareError::Malformed);
        }
        let mut payload = [0u8; SHARE_PAYLOAD_SIZE];
        payload.copy_from_slice(&unwrapped);
        Ok(payload)
    }

    /// The byte surface a sender signs: `ephemeral_pubkey || wrapped`.
    fn signed_surface(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(KEY_SIZE + self.wrapped.len());
        bytes.extend_from_slice(&self.ephemeral);
        bytes.extend_from_slice(&self.wrapped);
        bytes
    }
}

/// A [`SecretShare`] with the sender's detached signature over it.
///
/// Recipients verify provenance before touching the wrapped bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedShare {
    share: SecretShare,
    sig: Vec<u8>,
}

impl SignedShare {
    /// Wrap `payload` for `recipient` and sign it as `sender`.
    pub fn new(
        payload: &[u8; SHARE_PAYLOAD_SIZE],
        recipient: &EncryptionPublicKey,
        sender: &SigningKey,
    ) -> Result<Self, SecretShareError> {
        let share = SecretShare::new(payload, recipient)?;
        let sig = sender.sign(&share.signed_surface());
        Ok(Self { share, sig })
    }

    /// Verify the sender's signature, then recover the payload.
    pub fn verify_and_recover(
        &self,
        sender: &VerifyKey,
        recipient: &EncryptionKey,
    ) -> Result<[u8; SHARE_PAYLOAD_SIZE], SecretShareError> {
        sender.verify(&self.share.signed_surface(), &self.sig)?;
        self.share.recover(recipient)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn payload() -> [u8; SHARE_PAYLOAD_SIZE] {
        let mut bytes = [0u8; SHARE_PAYLOAD_SIZE];
        getrandom::getrandom(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_share_roundtrip() {
        let recipient = EncryptionKey::generate();
        let payload = payload();

        let share = SecretShare::new(&payload, &recipient.public()).unwrap();
        let recovered = share.recover(&recipient).unwrap();

        assert_eq!(payload, recovered);
    }

    #[test]
    fn test_share_wrong_recipient_fails() {
        let recipient = EncryptionKey::generate();
        let eavesdropper = EncryptionKey::generate();

        let share = SecretShare::new(&payload(), &recipient.public()).unwrap();
        let result = share.recover(&eavesdropper);

        assert!(matches!(result, Err(SecretShareError::Unwrap)));
    }

    #[test]
    fn test_signed_share_roundtrip() {
        let recipient = EncryptionKey::generate();
        let sender = SigningKey::generate();
        let payload = payload();

        let signed = SignedShare::new(&payload, &recipient.public(), &sender).unwrap();
        let recovered = signed
            .verify_and_recover(&sender.verify_key(), &recipient)
            .unwrap();

        assert_eq!(payload, recovered);
    }

    #[test]
    fn test_signed_share_rejects_forged_sender() {
        let recipient = EncryptionKey::generate();
        let sender = SigningKey::generate();
        let impostor = SigningKey::generate();

        let signed = SignedShare::new(&payload(), &recipient.public(), &sender).unwrap();
        let result = signed.verify_and_recover(&impostor.verify_key(), &recipient);

        assert!(matches!(result, Err(SecretShareError::Key(_))));
    }

    #[test]
    fn test_signed_share_rejects_tampered_wrap() {
        let recipient = EncryptionKey::generate();
        let sender = SigningKey::generate();

        let mut signed = SignedShare::new(&payload(), &recipient.public(), &sender).unwrap();
        signed.share.wrapped[0] ^= 0xFF;

        let result = signed.verify_and_recover(&sender.verify_key(), &recipient);
        assert!(result.is_err());
    }

    #[test]
    fn test_share_serde_roundtrip() {
        let recipient = EncryptionKey::generate();
        let sender = SigningKey::generate();
        let payload = payload();

        let signed = SignedShare::new(&payload, &recipient.public(), &sender).unwrap();
        let encoded = bincode::serialize(&signed).unwrap();
        let decoded: SignedShare = bincode::deserialize(&encoded).unwrap();

        assert_eq!(signed, decoded);
        let recovered = decoded
            .verify_and_recover(&sender.verify_key(), &recipient)
            .unwrap();
        assert_eq!(payload, recovered);
    }
}
