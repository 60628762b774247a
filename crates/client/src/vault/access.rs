use coffer_store::BlobStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{secret, SourceKey};
use crate::error::ClientError;

use super::invite::Invitation;

/// The per-(user, filename) capability.
///
/// Sealed at a locator derived from the user's root key and the filename,
/// so every session of the same user finds it without shared state. The
/// two variants are explicit: owners hold the metadata pointer and their
/// invitation catalog, sharees hold only the indirection the owner gave
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Access {
    Owner {
        /// Locator of the file's metadata record.
        meta: Uuid,
        /// Source key the metadata is sealed under.
        meta_key: SourceKey,
        /// Locator of the owner's invitation catalog.
        invite_list: Uuid,
        /// Source key the catalog is sealed under.
        invite_list_key: SourceKey,
    },
    Sharee {
        /// Locator of the invitation blob the owner wrote for this user.
        invitation: Uuid,
        /// Source key that invitation is sealed under.
        invitation_key: SourceKey,
    },
}

impl Access {
    pub fn is_owner(&self) -> bool {
        matches!(self, Access::Owner { .. })
    }

    /// Resolve the `(metadata locator, metadata source key)` this
    /// capability leads to.
    ///
    /// Owners carry the pair directly. Sharees read it from their
    /// invitation blob, so a revoked sharee — whose path to the metadata
    /// no longer authenticates — fails here or at the next hop.
    pub fn resolve_meta(&self, blobs: &BlobStore) -> Result<(Uuid, SourceKey), ClientError> {
        match self {
            Access::Owner { meta, meta_key, .. } => Ok((*meta, meta_key.clone())),
            Access::Sharee {
                invitation,
                invitation_key,
            } => {
                let bytes = blobs.get(invitation).ok_or_else(|| {
                    ClientError::Integrity("invitation record is missing".to_string())
                })?;
                let invitation: Invitation = secret::open(&bytes, invitation_key)?;
                Ok((invitation.meta, invitation.meta_key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_resolves_directly() {
        let blobs = BlobStore::new();
        let meta = Uuid::new_v4();
        let meta_key = SourceKey::generate();

        let access = Access::Owner {
            meta,
            meta_key: meta_key.clone(),
            invite_list: Uuid::new_v4(),
            invite_list_key: SourceKey::generate(),
        };

        assert!(access.is_owner());
        let (resolved, resolved_key) = access.resolve_meta(&blobs).unwrap();
        assert_eq!(resolved, meta);
        assert_eq!(resolved_key.as_bytes(), meta_key.as_bytes());
    }

    #[test]
    fn test_sharee_resolves_through_invitation() {
        let blobs = BlobStore::new();
        let meta = Uuid::new_v4();
        let meta_key = SourceKey::generate();

        let invitation_id = Uuid::new_v4();
        let invitation_key = SourceKey::generate();
        let invitation = Invitation {
            meta,
            meta_key: meta_key.clone(),
        };
        blobs.set(invitation_id, secret::seal(&invitation, &invitation_key).unwrap());

        let access = Access::Sharee {
            invitation: invitation_id,
            invitation_key,
        };

        assert!(!access.is_owner());
        let (resolved, resolved_key) = access.resolve_meta(&blobs).unwrap();
        assert_eq!(resolved, meta);
        assert_eq!(resolved_key.as_bytes(), meta_key.as_bytes());
    }

    #[test]
    fn test_sharee_missing_invitation_is_integrity() {
        let blobs = BlobStore::new();
        let access = Access::Sharee {
            invitation: Uuid::new_v4(),
            invitation_key: SourceKey::generate(),
        };

        let result = access.resolve_meta(&blobs);
        assert!(matches!(result, Err(ClientError::Integrity(_))));
    }

    #[test]
    fn test_sharee_rekeyed_invitation_is_integrity() {
        // After the owner re-seals an invitation under a new source key,
        // the old key no longer opens it.
        let blobs = BlobStore::new();
        let invitation_id = Uuid::new_v4();
        let invitation = Invitation {
            meta: Uuid::new_v4(),
            meta_key: SourceKey::generate(),
        };
        blobs.set(
            invitation_id,
            secret::seal(&invitation, &SourceKey::generate()).unwrap(),
        );

        let access = Access::Sharee {
            invitation: invitation_id,
            invitation_key: SourceKey::generate(),
        };

        let result = access.resolve_meta(&blobs);
        assert!(matches!(result, Err(ClientError::Integrity(_))));
    }
}
