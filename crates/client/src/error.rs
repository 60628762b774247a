use thiserror::Error;

use crate::crypto::{KeyError, SealError, SecretShareError};

/// Errors surfaced by the client API.
///
/// The kinds are deliberately coarse. In particular, a blob that is
/// *missing* somewhere the protocol expects one is indistinguishable from
/// a blob that was tampered away, so both report [`ClientError::Integrity`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The caller passed an argument the protocol rejects outright.
    #[error("invalid input: {0}")]
    Input(String),

    /// The operation collides with state that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The named file or token is not present in the caller's view.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not authorized, or credentials do not check out.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A blob failed authentication, decoded to garbage after a valid tag,
    /// or went missing partway through resolution.
    #[error("integrity check failed: {0}")]
    Integrity(String),
}

impl From<SealError> for ClientError {
    fn from(err: SealError) -> Self {
        ClientError::Integrity(err.to_string())
    }
}

impl From<KeyError> for ClientError {
    fn from(err: KeyError) -> Self {
        ClientError::Integrity(err.to_string())
    }
}

impl From<SecretShareError> for ClientError {
    fn from(err: SecretShareError) -> Self {
        ClientError::Integrity(err.to_string())
    }
}
