//! Label-addressed public-key directory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Errors from directory writes.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory label already taken: {0}")]
    LabelTaken(String),
}

/// Shared handle to the process-wide public-key directory.
///
/// The directory is append-only: a label can be written exactly once and
/// never mutated afterwards, which is what makes it a trustworthy root for
/// key lookups. Keys are stored as the raw bytes the publisher provided.
#[derive(Debug, Default, Clone)]
pub struct KeyDirectory {
    keys: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `key` under `label`. Fails if the label is already present.
    pub fn put(&self, label: &str, key: Vec<u8>) -> Result<(), DirectoryError> {
        let mut keys = self.keys.write();
        if keys.contains_key(label) {
            return Err(DirectoryError::LabelTaken(label.to_string()));
        }
        keys.insert(label.to_string(), key);
        Ok(())
    }

    /// Fetch the key published under `label`, if any.
    pub fn get(&self, label: &str) -> Option<Vec<u8>> {
        self.keys.read().get(label).cloned()
    }

    /// Whether a key is published under `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.keys.read().contains_key(label)
    }

    /// Drop every published key.
    pub fn clear(&self) {
        self.keys.write().clear();
    }
}
