//! UUID-addressed blob storage.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// Shared handle to the process-wide blob store.
///
/// Values are opaque bytes; the store never inspects them. Writes are
/// last-writer-wins per UUID. Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct BlobStore {
    blobs: Arc<RwLock<HashMap<Uuid, Vec<u8>>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the bytes stored at `id`, if any.
    pub fn get(&self, id: &Uuid) -> Option<Vec<u8>> {
        self.blobs.read().get(id).cloned()
    }

    /// Store `bytes` at `id`, replacing any previous value.
    pub fn set(&self, id: Uuid, bytes: Vec<u8>) {
        self.blobs.write().insert(id, bytes);
    }

    /// Whether any value is present at `id`.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.blobs.read().contains_key(id)
    }

    /// Drop every stored blob.
    pub fn clear(&self) {
        self.blobs.write().clear();
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Every UUID currently present.
    ///
    /// Intended for tests that need to locate and corrupt specific blobs;
    /// clients never enumerate the store.
    pub fn ids(&self) -> Vec<Uuid> {
        self.blobs.read().keys().copied().collect()
    }
}
