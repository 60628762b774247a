//! The encrypted block chain backing a file.
//!
//! File contents live as a singly linked list of sealed blocks. The
//! metadata record tracks the first slot and the *reserved* slot one past
//! the final block; a block whose `next` equals the reserved slot is the
//! tail. Appending writes one block at the reserved slot and reserves a
//! new one — O(1) regardless of file length, with no reads of existing
//! blocks.

use coffer_store::BlobStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{secret, SourceKey};
use crate::error::ClientError;

/// Per-file metadata: the join point between the authorization graph and
/// the content chain.
///
/// The record's locator stays stable for the file's whole life (sharees
/// hold pointers to it); its source key changes on revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// First block of the chain.
    pub start: Uuid,
    /// Reserved slot for the next append. Equal to `start` iff the file
    /// has no blocks.
    pub last: Uuid,
    /// Source key every block of the chain is sealed under.
    pub content_key: SourceKey,
}

/// One sealed content block.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileBlock {
    pub contents: Vec<u8>,
    pub next: Uuid,
}

/// Seal one block of `contents` at `slot`, reserving and returning the
/// locator of the slot after it.
pub fn write_block(
    blobs: &BlobStore,
    slot: Uuid,
    content_key: &SourceKey,
    contents: &[u8],
) -> Result<Uuid, ClientError> {
    let next = Uuid::new_v4();
    let block = FileBlock {
        contents: contents.to_vec(),
        next,
    };
    blobs.set(slot, secret::seal(&block, content_key)?);
    Ok(next)
}

/// Walk the chain from `start` to the reserved slot, concatenating block
/// contents. Any hop that is missing or fails authentication aborts.
pub fn read_chain(blobs: &BlobStore, meta: &FileMeta) -> Result<Vec<u8>, ClientError> {
    let mut contents = Vec::new();
    let mut cursor = meta.start;

    while cursor != meta.last {
        let bytes = blobs
            .get(&cursor)
            .ok_or_else(|| ClientError::Integrity("file block is missing".to_string()))?;
        let block: FileBlock = secret::open(&bytes, &meta.content_key)?;
        contents.extend_from_slice(&block.contents);
        cursor = block.next;
    }

    Ok(contents)
}
