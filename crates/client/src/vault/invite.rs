//! Invitation records, the owner's catalog of them, and the one-shot
//! sealed token handed to a recipient.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{
    EncryptionKey, EncryptionPublicKey, SigningKey, SignedShare, SourceKey, VerifyKey,
    SOURCE_KEY_SIZE,
};
use crate::error::ClientError;

/// The indirection a sharee's access resolves through.
///
/// Written by the file owner at a locator deterministic in the owner's
/// root key, so revocation can re-seal it (or strand it) without the
/// sharee's cooperation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Locator of the file's metadata record.
    pub meta: Uuid,
    /// Source key the metadata is sealed under.
    pub meta_key: SourceKey,
}

/// The owner's catalog of outstanding invitations, consulted only during
/// revocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteList {
    invitations: BTreeMap<Uuid, SourceKey>,
}

impl InviteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outstanding invitation and the key it is sealed under.
    pub fn insert(&mut self, invitation: Uuid, key: SourceKey) {
        self.invitations.insert(invitation, key);
    }

    /// Drop an invitation from the catalog, returning its key if present.
    pub fn remove(&mut self, invitation: &Uuid) -> Option<SourceKey> {
        self.invitations.remove(invitation)
    }

    /// Whether the catalog holds the given invitation.
    pub fn contains(&self, invitation: &Uuid) -> bool {
        self.invitations.contains_key(invitation)
    }

    /// Iterate over the outstanding `(locator, source key)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &SourceKey)> {
        self.invitations.iter()
    }

    pub fn len(&self) -> usize {
        self.invitations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invitations.is_empty()
    }
}

/// Seal a `(invitation locator, invitation key)` pair into the one-shot
/// token bytes a recipient consumes at accept time.
pub fn seal_token(
    invitation: Uuid,
    invitation_key: &SourceKey,
    recipient: &EncryptionPublicKey,
    sender: &SigningKey,
) -> Result<Vec<u8>, ClientError> {
    let mut payload = [0u8; 32];
    payload[..16].copy_from_slice(invitation.as_bytes());
    payload[16..].copy_from_slice(invitation_key.as_bytes());

    let share = SignedShare::new(&payload, recipient, sender)?;
    bincode::serialize(&share)
        .map_err(|_| ClientError::Integrity("invitation token could not be encoded".to_string()))
}

/// Open token bytes: verify the sender's signature, then unwrap the
/// `(invitation locator, invitation key)` pair for the recipient.
pub fn open_token(
    bytes: &[u8],
    sender: &VerifyKey,
    recipient: &EncryptionKey,
) -> Result<(Uuid, SourceKey), ClientError> {
    let share: SignedShare = bincode::deserialize(bytes)
        .map_err(|_| ClientError::Integrity("malformed invitation token".to_string()))?;
    let payload = share.verify_and_recover(sender, recipient)?;

    let mut locator = [0u8; 16];
    locator.copy_from_slice(&payload[..16]);
    let mut key = [0u8; SOURCE_KEY_SIZE];
    key.copy_from_slice(&payload[16..]);

    Ok((Uuid::from_bytes(locator), SourceKey::from_bytes(key)))
}
