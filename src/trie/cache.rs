use crate::types::B256;
use ahash::AHashMap;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

/// Shared stem-hash cache: concurrent lookups, exclusive inserts,
/// insertion-order FIFO eviction.
#[derive(Debug)]
pub struct MerkleCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: AHashMap<B256, B256>,
    order: VecDeque<B256>,
}

impl MerkleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &B256) -> Option<B256> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .get(key)
            .copied()
    }

    pub fn insert(&self, key: B256, value: B256) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.map.contains_key(&key) {
            return;
        }
        while inner.map.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            } else {
                break;
            }
        }
        inner.map.insert(key, value);
        inner.order.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
