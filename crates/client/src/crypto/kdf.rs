//! Password hashing and key derivation: Argon2id for credentials,
//! HKDF-SHA256 for everything below the root key.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use zeroize::Zeroize;

use super::secret::{SourceKey, SOURCE_KEY_SIZE};

/// Errors from key derivation.
#[derive(Debug, thiserror::Error)]
pub enum KdfError {
    #[error("invalid Argon2id parameters")]
    InvalidParams,
    #[error("password hashing failed")]
    PasswordHash,
}

/// Argon2id cost parameters.
///
/// The defaults are sized for interactive logins. Tests use
/// [`KdfParams::TEST`], which trades hardness for speed.
#[derive(Debug, Clone, Copy)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub mem_cost_kib: u32,
    /// Time cost / iterations.
    pub time_cost: u32,
    /// Parallelism.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Fast profile for tests. Not for production credentials.
    pub const TEST: KdfParams = KdfParams {
        mem_cost_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    };
}

/// The user's master secret, derived from their password at login and held
/// only in memory. Everything in the user's namespace is reachable from it.
///
/// Zeroized on drop so the secret does not linger after a session ends.
pub struct RootKey {
    bytes: [u8; SOURCE_KEY_SIZE],
}

impl Drop for RootKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl RootKey {
    /// Derive a source key for the given purpose label.
    ///
    /// Deterministic: the same root key and label always produce the same
    /// source key, which is how later sessions of the same user find their
    /// own sealed records.
    pub fn derive_source_key(&self, label: &[u8]) -> SourceKey {
        let mut bytes = [0u8; SOURCE_KEY_SIZE];
        hkdf_expand(&self.bytes, label, &mut bytes);
        SourceKey::from_bytes(bytes)
    }

    /// Derive a blob-store locator for the given purpose label.
    pub fn derive_locator(&self, label: &[u8]) -> Uuid {
        let mut bytes = [0u8; 16];
        hkdf_expand(&self.bytes, label, &mut bytes);
        Uuid::from_bytes(bytes)
    }
}

/// Derive the root key from a username and password via Argon2id.
///
/// The username acts as the salt (digested below), so equal passwords on
/// different accounts still yield unrelated keys.
pub fn derive_root_key(
    username: &str,
    password: &str,
    params: &KdfParams,
) -> Result<RootKey, KdfError> {
    let salt = domain_salt(b"coffer/root-key", username.as_bytes());
    let mut bytes = [0u8; SOURCE_KEY_SIZE];
    argon2id(params, password.as_bytes(), &salt, &mut bytes)?;
    Ok(RootKey { bytes })
}

/// Derive the deterministic locator of a user's sealed record.
///
/// Depends only on the username, so registration can probe for an existing
/// user and any login can find the record without further state.
pub fn derive_user_locator(username: &str, params: &KdfParams) -> Result<Uuid, KdfError> {
    let salt = domain_salt(b"coffer/user-locator", b"");
    let mut bytes = [0u8; 16];
    argon2id(params, username.as_bytes(), &salt, &mut bytes)?;
    Ok(Uuid::from_bytes(bytes))
}

/// HKDF-SHA256 expansion of `ikm` under an info label.
///
/// Infallible for the output sizes used here (HKDF caps output at 255
/// hash blocks, far above any key or locator in this crate).
pub(crate) fn hkdf_expand(ikm: &[u8], info: &[u8], out: &mut [u8]) {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    hk.expand(info, out).expect("HKDF output length within bounds");
}

/// Build a 32-byte Argon2 salt from a domain tag and context bytes.
///
/// Argon2id enforces a minimum salt length, so short contexts (or the
/// empty one) are run through SHA-256 rather than used raw. Deterministic.
fn domain_salt(domain: &[u8], context: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(context);
    hasher.finalize().into()
}

fn argon2id(
    params: &KdfParams,
    secret: &[u8],
    salt: &[u8],
    out: &mut [u8],
) -> Result<(), KdfError> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(out.len()),
    )
    .map_err(|_| KdfError::InvalidParams)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);
    argon2
        .hash_password_into(secret, salt, out)
        .map_err(|_| KdfError::PasswordHash)
}
