/**
 * Cryptographic primitives.
 *  - Password hashing and key derivation
 *  - Source keys and the sealed-blob envelope
 *  - User identity keypairs
 *  - Key-to-key payload sharing
 */
pub mod crypto;
/**
 * The client error taxonomy. Every fallible operation
 *  in the public API reports one of these kinds.
 */
pub mod error;
/**
 * The vault layer: per-user namespaces of encrypted,
 *  shareable files layered over the blob store, and the
 *  sessions that operate on them.
 */
pub mod vault;

pub mod prelude {
    pub use crate::crypto::kdf::KdfParams;
    pub use crate::error::ClientError;
    pub use crate::vault::{Client, Session};
    pub use coffer_store::{BlobStore, KeyDirectory};
}
