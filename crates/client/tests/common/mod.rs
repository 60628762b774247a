//! Shared test utilities for client integration tests
#![allow(dead_code)]

use coffer_client::prelude::*;
use uuid::Uuid;

pub const PASSWORD: &str = "password";

/// Set up a test environment: fresh stores and a client using the fast
/// Argon2id profile.
pub fn setup() -> (Client, BlobStore, KeyDirectory) {
    let blobs = BlobStore::new();
    let directory = KeyDirectory::new();
    let client = Client::with_kdf_params(blobs.clone(), directory.clone(), KdfParams::TEST);
    (client, blobs, directory)
}

/// Register a user with the shared test password.
pub fn register(client: &Client, username: &str) -> Session {
    client.register(username, PASSWORD).unwrap()
}

/// Full copy of the blob store's current contents.
pub fn snapshot(blobs: &BlobStore) -> Vec<(Uuid, Vec<u8>)> {
    blobs
        .ids()
        .into_iter()
        .map(|id| (id, blobs.get(&id).unwrap()))
        .collect()
}

/// Reset the blob store to a previously taken snapshot.
pub fn restore(blobs: &BlobStore, snapshot: &[(Uuid, Vec<u8>)]) {
    blobs.clear();
    for (id, bytes) in snapshot {
        blobs.set(*id, bytes.clone());
    }
}

/// The blob UUIDs present now but not in `before`.
pub fn new_ids(blobs: &BlobStore, before: &[Uuid]) -> Vec<Uuid> {
    blobs
        .ids()
        .into_iter()
        .filter(|id| !before.contains(id))
        .collect()
}
