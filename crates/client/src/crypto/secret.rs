//! Source keys and the sealed-blob envelope.
//!
//! Every record persisted to the blob store is sealed under a 16-byte
//! *source key*. Two working keys are derived from it by purpose label:
//! an encryption key (`"encrypt"`) for ChaCha20-Poly1305 and a MAC key
//! (`"mac"`) for HMAC-SHA256 over the ciphertext. The envelope written to
//! the store is `bincode({ msg, tag })` where `msg` is
//! `nonce || ciphertext` and `tag` authenticates `msg`.
//!
//! The HMAC tag is independent of the cipher and is the sole integrity
//! anchor: [`open`] verifies it before any decryption, and classifies a
//! record that decodes to garbage *after* a valid tag as tampering too.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::hkdf_expand;

/// Size of a source key in bytes.
pub const SOURCE_KEY_SIZE: usize = 16;

/// Size of a ChaCha20-Poly1305 nonce in bytes.
const NONCE_SIZE: usize = 12;

/// Size of the derived encryption and MAC keys in bytes.
const DERIVED_KEY_SIZE: usize = 32;

const ENCRYPT_LABEL: &[u8] = b"encrypt";
const MAC_LABEL: &[u8] = b"mac";

type HmacSha256 = Hmac<Sha256>;

/// Errors from sealing and opening blobs.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("record could not be encoded")]
    Encode,
    #[error("nonce generation failed")]
    Rng,
    #[error("blob failed its integrity check")]
    Integrity,
}

/// A 16-byte secret from which the working keys of one blob (or one small
/// family of blobs) are derived.
///
/// A source key is never stored beside the blob it seals; it is reached
/// only through an authenticated parent blob or derived from the user's
/// credentials. Zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SourceKey([u8; SOURCE_KEY_SIZE]);

impl std::fmt::Debug for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl SourceKey {
    /// Generate a fresh random source key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SOURCE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SOURCE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SOURCE_KEY_SIZE] {
        &self.0
    }

    fn encryption_key(&self) -> [u8; DERIVED_KEY_SIZE] {
        let mut key = [0u8; DERIVED_KEY_SIZE];
        hkdf_expand(&self.0, ENCRYPT_LABEL, &mut key);
        key
    }

    fn mac_key(&self) -> [u8; DERIVED_KEY_SIZE] {
        let mut key = [0u8; DERIVED_KEY_SIZE];
        hkdf_expand(&self.0, MAC_LABEL, &mut key);
        key
    }
}

/// The two-field envelope persisted at every blob slot.
#[derive(Serialize, Deserialize)]
struct SealedBlob {
    msg: Vec<u8>,
    tag: Vec<u8>,
}

/// Seal `record` under `key`, producing the bytes to persist.
///
/// A fresh random nonce is drawn per call, so sealing the same record
/// twice yields different bytes.
pub fn seal<T: Serialize>(record: &T, key: &SourceKey) -> Result<Vec<u8>, SealError> {
    let plaintext = bincode::serialize(record).map_err(|_| SealError::Encode)?;

    let mut enc_key = key.encryption_key();
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&enc_key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce_bytes).map_err(|_| SealError::Rng)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|_| SealError::Encode)?;
    enc_key.zeroize();

    let mut msg = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    msg.extend_from_slice(&nonce_bytes);
    msg.extend_from_slice(&ciphertext);

    let mut mac_key = key.mac_key();
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&mac_key).expect("HMAC accepts any key length");
    mac.update(&msg);
    let tag = mac.finalize().into_bytes().to_vec();
    mac_key.zeroize();

    bincode::serialize(&SealedBlob { msg, tag }).map_err(|_| SealError::Encode)
}

/// Open a sealed blob, verifying its tag before decrypting.
///
/// Every failure mode — malformed envelope, tag mismatch, decryption
/// failure, or a plaintext that no longer decodes as `T` — reports the
/// same [`SealError::Integrity`], since none is distinguishable from
/// tampering.
pub fn open<T: DeserializeOwned>(bytes: &[u8], key: &SourceKey) -> Result<T, SealError> {
    let blob: SealedBlob = bincode::deserialize(bytes).map_err(|_| SealError::Integrity)?;

    let mut mac_key = key.mac_key();
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&mac_key).expect("HMAC accepts any key length");
    mac.update(&blob.msg);
    let verified = mac.verify_slice(&blob.tag);
    mac_key.zeroize();
    verified.map_err(|_| SealError::Integrity)?;

    if blob.msg.len() < NONCE_SIZE {
        return Err(SealError::Integrity);
    }
    let (nonce_bytes, ciphertext) = blob.msg.split_at(NONCE_SIZE);

    let mut enc_key = key.encryption_key();
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&enc_key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| SealError::Integrity);
    enc_key.zeroize();

    bincode::deserialize(&plaintext?).map_err(|_| SealError::Integrity)
}
