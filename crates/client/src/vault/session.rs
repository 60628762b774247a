//! User lifecycle and the client operations.
//!
//! A [`Client`] binds the two storage collaborators and the Argon2id cost
//! profile; [`Client::register`] and [`Client::login`] produce a
//! [`Session`] holding the user's root key and private keypairs in memory.
//! Sessions share no in-process state: every operation re-reads and
//! re-authenticates persistent records, so concurrent sessions of the same
//! user observe each other's committed writes.

use coffer_store::{BlobStore, KeyDirectory};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::crypto::kdf::{self, KdfParams, RootKey};
use crate::crypto::keys::KEY_SIZE;
use crate::crypto::{secret, EncryptionKey, EncryptionPublicKey, SigningKey, SourceKey, VerifyKey};
use crate::error::ClientError;

use super::access::Access;
use super::chain::{self, FileMeta};
use super::invite::{self, Invitation, InviteList};

// Derivation labels. Locators and seal keys use distinct prefixes so a
// blob's address never coincides with the key that seals it.
const USER_SEAL: &[u8] = b"user-seal";
const ACCESS_LOCATOR: &[u8] = b"access-locator/";
const ACCESS_SEAL: &[u8] = b"access-seal/";
const INVITE_LOCATOR: &[u8] = b"invite-locator/";

/// A user's sealed record: their identity and private key material,
/// reachable only with the root key derived from their password.
#[derive(Serialize, Deserialize)]
struct UserRecord {
    username: String,
    encryption_key: [u8; KEY_SIZE],
    signing_key: [u8; KEY_SIZE],
}

/// Entry point to the vault: the storage collaborators plus the Argon2id
/// cost profile used for credentials.
#[derive(Clone)]
pub struct Client {
    blobs: BlobStore,
    directory: KeyDirectory,
    kdf: KdfParams,
}

impl Client {
    /// Create a client with the default (production-strength) KDF profile.
    pub fn new(blobs: BlobStore, directory: KeyDirectory) -> Self {
        Self::with_kdf_params(blobs, directory, KdfParams::default())
    }

    /// Create a client with an explicit KDF profile.
    pub fn with_kdf_params(blobs: BlobStore, directory: KeyDirectory, kdf: KdfParams) -> Self {
        Self {
            blobs,
            directory,
            kdf,
        }
    }

    /// Register a new user and open a session for them.
    ///
    /// Publishes the user's two public keys to the directory and seals
    /// their record at a locator deterministic in the username.
    pub fn register(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        if username.is_empty() {
            return Err(ClientError::Input("username cannot be empty".to_string()));
        }

        let locator = kdf::derive_user_locator(username, &self.kdf)
            .map_err(|e| ClientError::Input(e.to_string()))?;
        if self.blobs.contains(&locator) {
            return Err(ClientError::Conflict(format!(
                "username already registered: {username}"
            )));
        }

        let root = kdf::derive_root_key(username, password, &self.kdf)
            .map_err(|e| ClientError::Input(e.to_string()))?;
        let encryption_key = EncryptionKey::generate();
        let signing_key = SigningKey::generate();

        self.directory
            .put(
                &encryption_label(username),
                encryption_key.public().to_bytes().to_vec(),
            )
            .map_err(|e| ClientError::Conflict(e.to_string()))?;
        self.directory
            .put(
                &signature_label(username),
                signing_key.verify_key().to_bytes().to_vec(),
            )
            .map_err(|e| ClientError::Conflict(e.to_string()))?;

        let record = UserRecord {
            username: username.to_string(),
            encryption_key: encryption_key.to_bytes(),
            signing_key: signing_key.to_bytes(),
        };
        let sealed = secret::seal(&record, &root.derive_source_key(USER_SEAL))?;
        self.blobs.set(locator, sealed);

        debug!(user = %username, "registered user");
        Ok(Session {
            username: username.to_string(),
            root,
            encryption_key,
            signing_key,
            blobs: self.blobs.clone(),
            directory: self.directory.clone(),
        })
    }

    /// Authenticate a user and open a session for them.
    ///
    /// Beyond the empty-username check, every failure — unknown user, bad
    /// password, or a record that no longer authenticates — reports the
    /// same [`ClientError::Auth`] so the cause is not disclosed.
    pub fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        if username.is_empty() {
            return Err(ClientError::Input("username cannot be empty".to_string()));
        }

        let locator = kdf::derive_user_locator(username, &self.kdf)
            .map_err(|e| ClientError::Input(e.to_string()))?;
        let sealed = self
            .blobs
            .get(&locator)
            .ok_or_else(invalid_credentials)?;

        let root = kdf::derive_root_key(username, password, &self.kdf)
            .map_err(|e| ClientError::Input(e.to_string()))?;
        let record: UserRecord = secret::open(&sealed, &root.derive_source_key(USER_SEAL))
            .map_err(|_| invalid_credentials())?;

        // Binds the ciphertext to the identity: a record swapped in from
        // another user's slot decrypts to the wrong name.
        if record.username != username {
            return Err(invalid_credentials());
        }

        debug!(user = %username, "logged in");
        Ok(Session {
            username: record.username,
            root,
            encryption_key: EncryptionKey::from_bytes(record.encryption_key),
            signing_key: SigningKey::from_bytes(record.signing_key),
            blobs: self.blobs.clone(),
            directory: self.directory.clone(),
        })
    }
}

fn invalid_credentials() -> ClientError {
    ClientError::Auth("invalid credentials".to_string())
}

fn encryption_label(username: &str) -> String {
    format!("{username} public key")
}

fn signature_label(username: &str) -> String {
    format!("{username} signature key")
}

/// An authenticated user's in-memory state: root key, private keypairs,
/// and handles to the shared stores. Holds no per-file state.
#[derive(Debug)]
pub struct Session {
    username: String,
    root: RootKey,
    encryption_key: EncryptionKey,
    signing_key: SigningKey,
    blobs: BlobStore,
    directory: KeyDirectory,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Create `filename` with `content`, or overwrite it in place.
    ///
    /// Overwriting reuses the chain's first slot and the existing content
    /// key, and only moves the reserved tail slot — the metadata record
    /// (and thus every sharee's pointer to it) stays valid, which is what
    /// keeps an overwritten file shared.
    pub fn store_file(&self, filename: &str, content: &[u8]) -> Result<(), ClientError> {
        let locator = self.access_locator(filename);
        let seal_key = self.access_seal_key(filename);

        match self.blobs.get(&locator) {
            Some(sealed) => {
                let access: Access = secret::open(&sealed, &seal_key)?;
                let (meta_id, meta_key) = access.resolve_meta(&self.blobs)?;
                let mut meta = self.open_meta(&meta_id, &meta_key)?;

                meta.last = chain::write_block(&self.blobs, meta.start, &meta.content_key, content)?;
                self.blobs.set(meta_id, secret::seal(&meta, &meta_key)?);
            }
            None => {
                let content_key = SourceKey::generate();
                let start = Uuid::new_v4();
                let last = chain::write_block(&self.blobs, start, &content_key, content)?;

                let meta = FileMeta {
                    start,
                    last,
                    content_key,
                };
                let meta_id = Uuid::new_v4();
                let meta_key = SourceKey::generate();
                self.blobs.set(meta_id, secret::seal(&meta, &meta_key)?);

                let invite_list_id = Uuid::new_v4();
                let invite_list_key = SourceKey::generate();
                self.blobs.set(
                    invite_list_id,
                    secret::seal(&InviteList::new(), &invite_list_key)?,
                );

                let access = Access::Owner {
                    meta: meta_id,
                    meta_key,
                    invite_list: invite_list_id,
                    invite_list_key,
                };
                self.blobs.set(locator, secret::seal(&access, &seal_key)?);
            }
        }

        debug!(user = %self.username, "stored file");
        Ok(())
    }

    /// Append `content` to an existing file.
    ///
    /// Writes a single block at the reserved tail slot and reserves a new
    /// one; no existing block is read or decrypted, so the cost does not
    /// grow with file length.
    pub fn append_to_file(&self, filename: &str, content: &[u8]) -> Result<(), ClientError> {
        let (meta_id, meta_key) = self.resolve_file(filename)?;
        let mut meta = self.open_meta(&meta_id, &meta_key)?;

        meta.last = chain::write_block(&self.blobs, meta.last, &meta.content_key, content)?;
        self.blobs.set(meta_id, secret::seal(&meta, &meta_key)?);

        debug!(user = %self.username, "appended to file");
        Ok(())
    }

    /// Load the full contents of a file.
    pub fn load_file(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let (meta_id, meta_key) = self.resolve_file(filename)?;
        let meta = self.open_meta(&meta_id, &meta_key)?;
        chain::read_chain(&self.blobs, &meta)
    }

    /// Invite `recipient` to the file, returning the token to hand them
    /// out of band.
    ///
    /// Writes the invitation record at a locator deterministic in this
    /// user's root key (so revocation can find it again), seals the token
    /// to the recipient's published key, and signs it. Only owners record
    /// the invitation in their catalog; a resharer's invitations are
    /// revocable solely by cutting the resharer off.
    pub fn create_invitation(
        &self,
        filename: &str,
        recipient: &str,
    ) -> Result<Uuid, ClientError> {
        let recipient_key = self.directory.get(&encryption_label(recipient)).ok_or_else(|| {
            ClientError::Input(format!("no such user: {recipient}"))
        })?;
        if recipient == self.username {
            return Err(ClientError::Input(
                "cannot create an invitation for yourself".to_string(),
            ));
        }

        let access = self.load_access(filename)?;
        let (meta_id, meta_key) = access.resolve_meta(&self.blobs)?;
        // Authenticate the whole chain before minting a pointer into it; a
        // capability whose path no longer verifies must not be shareable.
        self.open_meta(&meta_id, &meta_key)?;

        let invitation_id = self.invitation_locator(recipient, filename);
        let invitation_key = SourceKey::generate();
        let invitation = Invitation {
            meta: meta_id,
            meta_key,
        };
        self.blobs
            .set(invitation_id, secret::seal(&invitation, &invitation_key)?);

        let recipient_key = EncryptionPublicKey::from_slice(&recipient_key)?;
        let token = invite::seal_token(
            invitation_id,
            &invitation_key,
            &recipient_key,
            &self.signing_key,
        )?;
        let token_id = Uuid::new_v4();
        self.blobs.set(token_id, token);

        if let Access::Owner {
            invite_list,
            invite_list_key,
            ..
        } = &access
        {
            let sealed = self.blobs.get(invite_list).ok_or_else(|| {
                ClientError::Integrity("invitation catalog is missing".to_string())
            })?;
            let mut list: InviteList = secret::open(&sealed, invite_list_key)?;
            list.insert(invitation_id, invitation_key);
            self.blobs
                .set(*invite_list, secret::seal(&list, invite_list_key)?);
        }

        debug!(user = %self.username, recipient = %recipient, "created invitation");
        Ok(token_id)
    }

    /// Accept an invitation from `sender`, installing the shared file
    /// under `filename` in this user's namespace.
    pub fn accept_invitation(
        &self,
        sender: &str,
        token: Uuid,
        filename: &str,
    ) -> Result<(), ClientError> {
        let locator = self.access_locator(filename);
        if self.blobs.contains(&locator) {
            return Err(ClientError::Conflict(format!(
                "a file named {filename:?} already exists"
            )));
        }

        let token_bytes = self
            .blobs
            .get(&token)
            .ok_or_else(|| ClientError::NotFound("invitation token is missing".to_string()))?;

        let verify_key = self.directory.get(&signature_label(sender)).ok_or_else(|| {
            ClientError::Integrity(format!("no published signature key for {sender}"))
        })?;
        let verify_key = VerifyKey::from_slice(&verify_key)?;
        let (invitation_id, invitation_key) =
            invite::open_token(&token_bytes, &verify_key, &self.encryption_key)?;

        // The invitation itself must exist and authenticate before this
        // user commits a capability pointing at it.
        let sealed = self.blobs.get(&invitation_id).ok_or_else(|| {
            ClientError::Integrity("invitation record is missing".to_string())
        })?;
        let _: Invitation = secret::open(&sealed, &invitation_key)?;

        let access = Access::Sharee {
            invitation: invitation_id,
            invitation_key,
        };
        self.blobs
            .set(locator, secret::seal(&access, &self.access_seal_key(filename))?);

        debug!(user = %self.username, sender = %sender, "accepted invitation");
        Ok(())
    }

    /// Revoke `recipient`'s access to `filename`, cutting off the
    /// recipient and everyone they re-shared with, while every other
    /// sharee keeps working access.
    pub fn revoke_access(&self, filename: &str, recipient: &str) -> Result<(), ClientError> {
        let access = self.load_access(filename)?;
        let Access::Owner {
            meta: meta_id,
            meta_key,
            invite_list,
            invite_list_key,
        } = access
        else {
            return Err(ClientError::Auth(
                "only the file's owner can revoke access".to_string(),
            ));
        };

        let meta = self.open_meta(&meta_id, &meta_key)?;

        let sealed = self.blobs.get(&invite_list).ok_or_else(|| {
            ClientError::Integrity("invitation catalog is missing".to_string())
        })?;
        let mut list: InviteList = secret::open(&sealed, &invite_list_key)?;

        let revoked_id = self.invitation_locator(recipient, filename);
        if !list.contains(&revoked_id) {
            return Err(ClientError::Auth(format!(
                "{recipient} does not hold a share of this file"
            )));
        }

        // Re-key the chain: the current contents move to fresh slots under
        // a fresh content key, so the old chain the revokee could still
        // decrypt is abandoned.
        let content = chain::read_chain(&self.blobs, &meta)?;
        let content_key = SourceKey::generate();
        let start = Uuid::new_v4();
        let last = chain::write_block(&self.blobs, start, &content_key, &content)?;

        // The metadata stays at its stable locator but under a fresh
        // source key the revokee never learns.
        let new_meta = FileMeta {
            start,
            last,
            content_key,
        };
        let new_meta_key = SourceKey::generate();
        self.blobs.set(meta_id, secret::seal(&new_meta, &new_meta_key)?);

        list.remove(&revoked_id);

        // Every surviving sharee's invitation is re-pointed at the
        // re-keyed metadata, in place, under its existing source key.
        for (invitation_id, invitation_key) in list.iter() {
            let invitation = Invitation {
                meta: meta_id,
                meta_key: new_meta_key.clone(),
            };
            self.blobs
                .set(*invitation_id, secret::seal(&invitation, invitation_key)?);
        }

        self.blobs
            .set(invite_list, secret::seal(&list, &invite_list_key)?);

        let access = Access::Owner {
            meta: meta_id,
            meta_key: new_meta_key,
            invite_list,
            invite_list_key,
        };
        self.blobs.set(
            self.access_locator(filename),
            secret::seal(&access, &self.access_seal_key(filename))?,
        );

        debug!(user = %self.username, recipient = %recipient, "revoked access");
        Ok(())
    }

    // ---- locator and record helpers ----

    fn access_locator(&self, filename: &str) -> Uuid {
        self.root.derive_locator(&label(ACCESS_LOCATOR, &[filename]))
    }

    fn access_seal_key(&self, filename: &str) -> SourceKey {
        self.root.derive_source_key(&label(ACCESS_SEAL, &[filename]))
    }

    fn invitation_locator(&self, sharee: &str, filename: &str) -> Uuid {
        self.root
            .derive_locator(&label(INVITE_LOCATOR, &[&self.username, filename, sharee]))
    }

    /// Open this user's access capability for `filename`.
    ///
    /// A missing capability is [`ClientError::NotFound`] (the file is not
    /// in the namespace); one that fails to authenticate is tampering.
    fn load_access(&self, filename: &str) -> Result<Access, ClientError> {
        let sealed = self.blobs.get(&self.access_locator(filename)).ok_or_else(|| {
            ClientError::NotFound(format!("no file named {filename:?} in namespace"))
        })?;
        Ok(secret::open(&sealed, &self.access_seal_key(filename))?)
    }

    /// Resolve `filename` down to its metadata locator and source key.
    fn resolve_file(&self, filename: &str) -> Result<(Uuid, SourceKey), ClientError> {
        self.load_access(filename)?.resolve_meta(&self.blobs)
    }

    fn open_meta(&self, meta_id: &Uuid, meta_key: &SourceKey) -> Result<FileMeta, ClientError> {
        let sealed = self.blobs.get(meta_id).ok_or_else(|| {
            ClientError::Integrity("file metadata record is missing".to_string())
        })?;
        Ok(secret::open(&sealed, meta_key)?)
    }
}

fn label(prefix: &[u8], parts: &[&str]) -> Vec<u8> {
    let mut bytes = prefix.to_vec();
    for part in parts {
        bytes.extend_from_slice(part.as_bytes());
    }
    bytes
}
