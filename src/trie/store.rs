//! Persistence contract for the trie: it never writes storage itself, it
//! hands serialized nodes to a [`NodeSink`] and pulls hashed subtrees back
//! through a [`NodeSource`].
//!
//! Storage keys are the node's bit path from the root (length-prefixed)
//! concatenated with its hash.

use crate::trie::TrieError;
use crate::types::B256;
use ahash::AHashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Resolves a hashed subtree back into its serialized form.
pub trait NodeSource: Send + Sync {
    fn resolve(&self, path: &[u8], hash: &B256) -> Result<Vec<u8>, TrieError>;
}

/// Receives serialized nodes during a flush.
pub trait NodeSink {
    fn put(&mut self, path: &[u8], hash: &B256, bytes: Vec<u8>);
}

/// Storage key: `len(path) ‖ path bits ‖ hash`.
pub fn storage_key(path: &[u8], hash: &B256) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + path.len() + 32);
    key.push(path.len() as u8);
    key.extend_from_slice(path);
    key.extend_from_slice(hash);
    key
}

/// In-memory node store for tests and snapshots; cloning shares the map.
#[derive(Clone, Default)]
pub struct MemoryNodeStore {
    inner: Arc<Mutex<AHashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeSource for MemoryNodeStore {
    fn resolve(&self, path: &[u8], hash: &B256) -> Result<Vec<u8>, TrieError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&storage_key(path, hash))
            .cloned()
            .ok_or_else(|| {
                TrieError::ResolveFailed(format!("missing node 0x{}", hex::encode(hash)))
            })
    }
}

impl NodeSink for MemoryNodeStore {
    fn put(&mut self, path: &[u8], hash: &B256, bytes: Vec<u8>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(storage_key(path, hash), bytes);
    }
}
