//! The binary state trie: 256-leaf stems under a bit-addressed spine of
//! internal nodes, with SHA-256 commitments throughout.
//!
//! Instances are single-threaded; callers serialize mutations and read
//! concurrently only from [`BinaryTrie::copy`] snapshots.

use crate::trie::cache::MerkleCache;
use crate::trie::node::{stem_bit, Node, StemNode, ZERO_HASH};
use crate::trie::proof::Proof;
use crate::trie::store::{NodeSink, NodeSource};
use crate::trie::TrieError;
use crate::types::B256;
use std::sync::Arc;

pub struct BinaryTrie {
    root: Node,
    source: Option<Arc<dyn NodeSource>>,
    cache: Option<Arc<MerkleCache>>,
}

impl Default for BinaryTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryTrie {
    pub fn new() -> Self {
        Self {
            root: Node::Empty,
            source: None,
            cache: None,
        }
    }

    /// Open a trie whose nodes live behind `source`, starting from the
    /// persisted root hash. Nodes materialize lazily as operations descend.
    pub fn from_root(root_hash: B256, source: Arc<dyn NodeSource>) -> Self {
        let root = if root_hash == ZERO_HASH {
            Node::Empty
        } else {
            Node::Hashed(root_hash)
        };
        Self {
            root,
            source: Some(source),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<MerkleCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Deep-copy snapshot, safe for concurrent reads while the original
    /// keeps mutating. Resolver and cache handles are shared.
    pub fn copy(&self) -> Self {
        Self {
            root: self.root.clone(),
            source: self.source.clone(),
            cache: self.cache.clone(),
        }
    }

    pub fn root_hash(&self) -> B256 {
        self.root.hash_with_cache(self.cache.as_deref())
    }

    pub fn insert(&mut self, key: B256, value: B256) -> Result<(), TrieError> {
        let stem: [u8; 31] = key[..31].try_into().expect("31-byte stem");
        let leaf = key[31];

        let mut path = Vec::new();
        let mut node = &mut self.root;
        loop {
            match node {
                Node::Empty => {
                    let depth = path.len();
                    *node = Node::Stem(Box::new(StemNode::with_value(stem, depth, leaf, value)));
                    return Ok(());
                }
                Node::Hashed(_) => {
                    resolve_in_place(node, &path, self.source.as_deref())?;
                }
                Node::Stem(existing) if existing.stem == stem => {
                    existing.values[leaf as usize] = Some(value);
                    return Ok(());
                }
                Node::Stem(_) => {
                    let depth = path.len();
                    let Node::Stem(old) = std::mem::replace(node, Node::Empty) else {
                        unreachable!("matched stem variant above");
                    };
                    *node = split_stems(old, stem, leaf, value, depth);
                    return Ok(());
                }
                Node::Internal { left, right, depth } => {
                    let bit = stem_bit(&stem, *depth);
                    path.push(bit);
                    node = if bit == 0 { left.as_mut() } else { right.as_mut() };
                }
            }
        }
    }

    /// Read a value. Absent keys and explicitly zeroed leaves are both
    /// reported as the caller sees them: `None` for structurally absent,
    /// `Some` with whatever 32 bytes are stored otherwise.
    pub fn get(&mut self, key: &B256) -> Result<Option<B256>, TrieError> {
        let stem: [u8; 31] = key[..31].try_into().expect("31-byte stem");
        let leaf = key[31] as usize;

        let mut path = Vec::new();
        let mut node = &mut self.root;
        loop {
            match node {
                Node::Empty => return Ok(None),
                Node::Hashed(_) => {
                    resolve_in_place(node, &path, self.source.as_deref())?;
                }
                Node::Stem(existing) => {
                    return Ok(if existing.stem == stem {
                        existing.values[leaf]
                    } else {
                        None
                    });
                }
                Node::Internal { left, right, depth } => {
                    let bit = stem_bit(&stem, *depth);
                    path.push(bit);
                    node = if bit == 0 { left.as_mut() } else { right.as_mut() };
                }
            }
        }
    }

    /// Delete by writing an all-zero value; the stem stays in place, which
    /// is exactly what keeps the root hash reproducible. Deleting a key
    /// whose stem never existed is a no-op.
    pub fn delete(&mut self, key: &B256) -> Result<(), TrieError> {
        if self.get(key)?.is_some() {
            self.insert(*key, ZERO_HASH)?;
        }
        Ok(())
    }

    /// Inclusion proof for `key`: the stem binding plus every sibling hash
    /// from the root down to the leaf slot.
    pub fn prove(&mut self, key: &B256) -> Result<Proof, TrieError> {
        let stem: [u8; 31] = key[..31].try_into().expect("31-byte stem");
        let leaf = key[31];
        let cache = self.cache.clone();

        let mut path = Vec::new();
        let mut siblings = Vec::new();
        let mut node = &mut self.root;
        loop {
            match node {
                Node::Empty => return Err(TrieError::StemNotFound),
                Node::Hashed(_) => {
                    resolve_in_place(node, &path, self.source.as_deref())?;
                }
                Node::Stem(existing) => {
                    if existing.stem != stem {
                        return Err(TrieError::StemNotFound);
                    }
                    let value = existing.values[leaf as usize].unwrap_or(ZERO_HASH);
                    siblings.extend(stem_siblings(existing, leaf));
                    return Ok(Proof {
                        key: *key,
                        value,
                        stem,
                        leaf_index: leaf,
                        siblings,
                    });
                }
                Node::Internal { left, right, depth } => {
                    let bit = stem_bit(&stem, *depth);
                    let sibling = if bit == 0 {
                        right.hash_with_cache(cache.as_deref())
                    } else {
                        left.hash_with_cache(cache.as_deref())
                    };
                    siblings.push(sibling);
                    path.push(bit);
                    node = if bit == 0 { left.as_mut() } else { right.as_mut() };
                }
            }
        }
    }

    /// Hand every materialized node to the sink, keyed by bit path and
    /// hash. Hashed placeholders are already persisted and are skipped.
    pub fn flush(&self, sink: &mut dyn NodeSink) -> Result<(), TrieError> {
        let mut path = Vec::new();
        flush_node(&self.root, &mut path, sink)
    }
}

fn resolve_in_place(
    node: &mut Node,
    path: &[u8],
    source: Option<&dyn NodeSource>,
) -> Result<(), TrieError> {
    let Node::Hashed(hash) = node else {
        return Ok(());
    };
    let hash = *hash;
    let source = source.ok_or(TrieError::UnresolvedNode)?;
    let bytes = source.resolve(path, &hash)?;
    let resolved = Node::deserialize(&bytes, path.len())?;
    if resolved.hash() != hash {
        return Err(TrieError::CorruptNode(format!(
            "resolved node hash mismatch at path {:?}",
            path
        )));
    }
    *node = resolved;
    Ok(())
}

/// Split two diverging stems: internal nodes run from `depth` down to the
/// first differing bit, with each stem on its respective side.
fn split_stems(
    mut old: Box<StemNode>,
    stem: [u8; 31],
    leaf: u8,
    value: B256,
    depth: usize,
) -> Node {
    let mut diff = depth;
    while stem_bit(&old.stem, diff) == stem_bit(&stem, diff) {
        diff += 1;
    }

    old.depth = diff + 1;
    let new = Box::new(StemNode::with_value(stem, diff + 1, leaf, value));
    let (left, right) = if stem_bit(&stem, diff) == 0 {
        (Node::Stem(new), Node::Stem(old))
    } else {
        (Node::Stem(old), Node::Stem(new))
    };

    let mut current = Node::Internal {
        left: Box::new(left),
        right: Box::new(right),
        depth: diff,
    };
    for d in (depth..diff).rev() {
        current = if stem_bit(&stem, d) == 0 {
            Node::Internal {
                left: Box::new(current),
                right: Box::new(Node::Empty),
                depth: d,
            }
        } else {
            Node::Internal {
                left: Box::new(Node::Empty),
                right: Box::new(current),
                depth: d,
            }
        };
    }
    current
}

/// Sibling hashes inside the stem's 8-level subtree, ordered root-to-leaf.
fn stem_siblings(stem: &StemNode, leaf_index: u8) -> Vec<B256> {
    use crate::trie::node::{sha256_pair, STEM_LEAVES, STEM_LEVELS};

    let mut levels: Vec<Vec<B256>> = Vec::with_capacity(STEM_LEVELS);
    levels.push((0..STEM_LEAVES).map(|i| stem.leaf_hash(i)).collect());
    for l in 0..STEM_LEVELS - 1 {
        let prev = &levels[l];
        levels.push(
            prev.chunks(2)
                .map(|pair| sha256_pair(&pair[0], &pair[1]))
                .collect(),
        );
    }

    let mut siblings: Vec<B256> = (0..STEM_LEVELS)
        .map(|l| {
            let idx = (leaf_index as usize) >> l;
            levels[l][idx ^ 1]
        })
        .collect();
    siblings.reverse();
    siblings
}

fn flush_node(node: &Node, path: &mut Vec<u8>, sink: &mut dyn NodeSink) -> Result<(), TrieError> {
    match node {
        Node::Empty | Node::Hashed(_) => Ok(()),
        Node::Stem(_) => {
            sink.put(path, &node.hash(), node.serialize()?);
            Ok(())
        }
        Node::Internal { left, right, .. } => {
            sink.put(path, &node.hash(), node.serialize()?);
            path.push(0);
            flush_node(left, path, sink)?;
            path.pop();
            path.push(1);
            flush_node(right, path, sink)?;
            path.pop();
            Ok(())
        }
    }
}
