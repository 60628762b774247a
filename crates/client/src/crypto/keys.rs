//! User identity keypairs.
//!
//! Each user holds two independent keypairs, generated at registration:
//!
//! - an **X25519** pair for receiving sealed payloads (the public half is
//!   published to the key directory under `"{username} public key"`)
//! - an **Ed25519** pair for signing payloads they send (the public half
//!   is published under `"{username} signature key"`)
//!
//! The private halves live inside the user's sealed record and are only
//! ever in memory while a session is open.

use ed25519_dalek::{Signature, Signer, SigningKey as Ed25519SigningKey, VerifyingKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

/// Size of every key handled here, public or private, in bytes.
pub const KEY_SIZE: usize = 32;

/// Errors from key decoding and signature checks.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key size, expected {KEY_SIZE}, got {0}")]
    InvalidLength(usize),
    #[error("malformed key bytes")]
    Malformed,
    #[error("signature verification failed")]
    BadSignature,
}

fn fixed_bytes(bytes: &[u8]) -> Result<[u8; KEY_SIZE], KeyError> {
    if bytes.len() != KEY_SIZE {
        return Err(KeyError::InvalidLength(bytes.len()));
    }
    let mut buff = [0u8; KEY_SIZE];
    buff.copy_from_slice(bytes);
    Ok(buff)
}

/// Private half of a user's encryption keypair (X25519 static secret).
#[derive(Clone)]
pub struct EncryptionKey(StaticSecret);

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl EncryptionKey {
    /// Generate a new random encryption keypair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self(StaticSecret::from(bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    /// The public half, suitable for publishing to the key directory.
    pub fn public(&self) -> EncryptionPublicKey {
        EncryptionPublicKey(X25519PublicKey::from(&self.0))
    }

    /// Diffie-Hellman agreement with a peer's public key.
    pub(crate) fn agree(&self, peer: &EncryptionPublicKey) -> [u8; KEY_SIZE] {
        *self.0.diffie_hellman(&peer.0).as_bytes()
    }
}

/// Public half of an encryption keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionPublicKey(X25519PublicKey);

impl EncryptionPublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(Self(X25519PublicKey::from(fixed_bytes(bytes)?)))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }
}

/// Private half of a user's signature keypair (Ed25519).
#[derive(Clone)]
pub struct SigningKey(Ed25519SigningKey);

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl SigningKey {
    /// Generate a new random signature keypair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self(Ed25519SigningKey::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Ed25519SigningKey::from_bytes(&bytes))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    /// The public half, suitable for publishing to the key directory.
    pub fn verify_key(&self) -> VerifyKey {
        VerifyKey(self.0.verifying_key())
    }

    /// Produce a detached signature over `msg`.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.0.sign(msg).to_bytes().to_vec()
    }
}

/// Public half of a signature keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyKey(VerifyingKey);

impl VerifyKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_bytes(&fixed_bytes(bytes)?).map_err(|_| KeyError::Malformed)?;
        Ok(Self(key))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Verify a detached signature over `msg`.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), KeyError> {
        let sig = Signature::from_slice(sig).map_err(|_| KeyError::BadSignature)?;
        self.0
            .verify_strict(msg, &sig)
            .map_err(|_| KeyError::BadSignature)
    }
}
