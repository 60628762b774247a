//! Cryptographic primitives for the coffer client.
//!
//! This module provides the building blocks the vault layer seals its
//! records with:
//!
//! - **Key derivation**: Argon2id turns `(username, password)` into a root
//!   key and a deterministic user locator; HKDF-SHA256 derives everything
//!   else from root and source keys under domain-separation labels.
//! - **Sealed blobs**: every persisted record is encrypted with
//!   ChaCha20-Poly1305 under a key derived from its source key, then tagged
//!   with an independent HMAC-SHA256. The tag is the sole integrity anchor
//!   and is always checked before decryption.
//! - **Identity**: each user holds an X25519 keypair for receiving sealed
//!   payloads and an Ed25519 keypair for signing them. The public halves
//!   are published once to the key directory.
//! - **Payload sharing**: a small secret is sealed to a recipient with an
//!   ephemeral-X25519 ECDH agreement and AES Key Wrap, and the result is
//!   signed by the sender.

pub mod kdf;
pub mod keys;
pub mod secret;
pub mod secret_share;

pub use kdf::{KdfError, KdfParams, RootKey};
pub use keys::{EncryptionKey, EncryptionPublicKey, KeyError, SigningKey, VerifyKey};
pub use secret::{SealError, SourceKey, SOURCE_KEY_SIZE};
pub use secret_share::{SecretShare, SecretShareError, SignedShare};
