//! Trie node variants and their canonical serialization.
//!
//! Wire forms (hashes are SHA-256 throughout):
//! - Internal: `0x02 ‖ left_hash(32) ‖ right_hash(32)`
//! - Stem:     `0x01 ‖ stem(31) ‖ bitmap(32) ‖ values(32·popcount)`
//! - Empty:    `0x00` (a zero-length encoding also decodes to Empty)

use crate::trie::cache::MerkleCache;
use crate::trie::TrieError;
use crate::types::B256;
use sha2::{Digest, Sha256};

pub const TAG_EMPTY: u8 = 0x00;
pub const TAG_STEM: u8 = 0x01;
pub const TAG_INTERNAL: u8 = 0x02;

pub const ZERO_HASH: B256 = [0u8; 32];

/// Width of a stem's leaf group and the depth of its internal Merkle tree.
pub const STEM_LEAVES: usize = 256;
pub const STEM_LEVELS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Empty,
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        depth: usize,
    },
    Stem(Box<StemNode>),
    /// Unresolved subtree known only by its hash; descending through it
    /// requires a resolver.
    Hashed(B256),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemNode {
    pub stem: [u8; 31],
    pub values: Box<[Option<B256>; STEM_LEAVES]>,
    pub depth: usize,
}

impl StemNode {
    pub fn new(stem: [u8; 31], depth: usize) -> Self {
        Self {
            stem,
            values: Box::new([None; STEM_LEAVES]),
            depth,
        }
    }

    pub fn with_value(stem: [u8; 31], depth: usize, leaf_index: u8, value: B256) -> Self {
        let mut node = Self::new(stem, depth);
        node.values[leaf_index as usize] = Some(value);
        node
    }

    /// Hash of one leaf slot: SHA-256 of the value for populated, non-zero
    /// leaves; absent and zeroed leaves both contribute the zero hash, which
    /// is what makes deletion-by-zeroing hash-equivalent to absence.
    pub fn leaf_hash(&self, leaf_index: usize) -> B256 {
        match &self.values[leaf_index] {
            Some(value) if *value != ZERO_HASH => sha256(value),
            _ => ZERO_HASH,
        }
    }

    /// The 8-level Merkle fold over the 256 leaf slots.
    pub fn sub_root(&self) -> B256 {
        let mut level: Vec<B256> = (0..STEM_LEAVES).map(|i| self.leaf_hash(i)).collect();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| sha256_pair(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }

    /// Stem commitment: `SHA256(stem ‖ 0x00 ‖ sub_root)`.
    pub fn stem_root(&self) -> B256 {
        let mut hasher = Sha256::new();
        hasher.update(self.stem);
        hasher.update([0u8]);
        hasher.update(self.sub_root());
        hasher.finalize().into()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bitmap = [0u8; 32];
        let mut present = 0usize;
        for (i, value) in self.values.iter().enumerate() {
            if value.is_some() {
                bitmap[i / 8] |= 1 << (7 - (i % 8));
                present += 1;
            }
        }

        let mut out = Vec::with_capacity(1 + 31 + 32 + 32 * present);
        out.push(TAG_STEM);
        out.extend_from_slice(&self.stem);
        out.extend_from_slice(&bitmap);
        for value in self.values.iter().flatten() {
            out.extend_from_slice(value);
        }
        out
    }
}

impl Node {
    /// Deterministic Merkle hash: zero for Empty, `SHA256(left ‖ right)`
    /// for Internal (missing children count as zero), the stem commitment
    /// for stems, and the recorded hash for unresolved subtrees.
    pub fn hash(&self) -> B256 {
        self.hash_with_cache(None)
    }

    pub fn hash_with_cache(&self, cache: Option<&MerkleCache>) -> B256 {
        match self {
            Node::Empty => ZERO_HASH,
            Node::Hashed(h) => *h,
            Node::Internal { left, right, .. } => sha256_pair(
                &left.hash_with_cache(cache),
                &right.hash_with_cache(cache),
            ),
            Node::Stem(stem) => {
                if let Some(cache) = cache {
                    let fingerprint = sha256(&stem.serialize());
                    if let Some(hash) = cache.get(&fingerprint) {
                        return hash;
                    }
                    let hash = stem.stem_root();
                    cache.insert(fingerprint, hash);
                    hash
                } else {
                    stem.stem_root()
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TrieError> {
        match self {
            Node::Empty => Ok(vec![TAG_EMPTY]),
            Node::Stem(stem) => Ok(stem.serialize()),
            Node::Internal { left, right, .. } => {
                let mut out = Vec::with_capacity(65);
                out.push(TAG_INTERNAL);
                out.extend_from_slice(&left.hash());
                out.extend_from_slice(&right.hash());
                Ok(out)
            }
            Node::Hashed(_) => Err(TrieError::CorruptNode(
                "unresolved subtree has no serialized form".into(),
            )),
        }
    }

    /// Decode a node at the given depth. Internal children come back as
    /// `Hashed` placeholders (or Empty for the zero hash); stems are
    /// normalized to the full 256-slot table regardless of how many values
    /// were present on the wire.
    pub fn deserialize(bytes: &[u8], depth: usize) -> Result<Self, TrieError> {
        if bytes.is_empty() {
            return Ok(Node::Empty);
        }
        match bytes[0] {
            TAG_EMPTY => Ok(Node::Empty),
            TAG_INTERNAL => {
                if bytes.len() != 65 {
                    return Err(TrieError::CorruptNode(format!(
                        "internal node must be 65 bytes, got {}",
                        bytes.len()
                    )));
                }
                let mut left_hash = [0u8; 32];
                let mut right_hash = [0u8; 32];
                left_hash.copy_from_slice(&bytes[1..33]);
                right_hash.copy_from_slice(&bytes[33..65]);
                Ok(Node::Internal {
                    left: Box::new(Self::from_child_hash(left_hash)),
                    right: Box::new(Self::from_child_hash(right_hash)),
                    depth,
                })
            }
            TAG_STEM => {
                if bytes.len() < 1 + 31 + 32 {
                    return Err(TrieError::CorruptNode("stem node too short".into()));
                }
                let mut stem = [0u8; 31];
                stem.copy_from_slice(&bytes[1..32]);
                let bitmap = &bytes[32..64];

                let present: usize = bitmap.iter().map(|b| b.count_ones() as usize).sum();
                let expected = 64 + 32 * present;
                if bytes.len() != expected {
                    return Err(TrieError::CorruptNode(format!(
                        "stem node expects {} bytes for {} values, got {}",
                        expected,
                        present,
                        bytes.len()
                    )));
                }

                let mut node = StemNode::new(stem, depth);
                let mut offset = 64;
                for i in 0..STEM_LEAVES {
                    if bitmap[i / 8] >> (7 - (i % 8)) & 1 == 1 {
                        let mut value = [0u8; 32];
                        value.copy_from_slice(&bytes[offset..offset + 32]);
                        node.values[i] = Some(value);
                        offset += 32;
                    }
                }
                Ok(Node::Stem(Box::new(node)))
            }
            tag => Err(TrieError::CorruptNode(format!("unknown node tag {tag:#x}"))),
        }
    }

    fn from_child_hash(hash: B256) -> Node {
        if hash == ZERO_HASH {
            Node::Empty
        } else {
            Node::Hashed(hash)
        }
    }
}

/// Branch bit at `depth`: bit `depth` of the stem, most significant first.
pub(crate) fn stem_bit(stem: &[u8; 31], depth: usize) -> u8 {
    (stem[depth / 8] >> (7 - depth % 8)) & 1
}

pub(crate) fn sha256(data: &[u8]) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub(crate) fn sha256_pair(left: &B256, right: &B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hashes_to_zero() {
        assert_eq!(Node::Empty.hash(), ZERO_HASH);
    }

    #[test]
    fn test_internal_hash_combines_children() {
        let stem = Node::Stem(Box::new(StemNode::with_value(
            [1u8; 31],
            1,
            0,
            [9u8; 32],
        )));
        let node = Node::Internal {
            left: Box::new(stem.clone()),
            right: Box::new(Node::Empty),
            depth: 0,
        };
        assert_eq!(node.hash(), sha256_pair(&stem.hash(), &ZERO_HASH));
    }

    #[test]
    fn test_zero_valued_leaf_hashes_like_absent() {
        let mut with_zero = StemNode::new([2u8; 31], 0);
        with_zero.values[7] = Some(ZERO_HASH);
        let without = StemNode::new([2u8; 31], 0);
        assert_eq!(with_zero.stem_root(), without.stem_root());
    }

    #[test]
    fn test_stem_serialize_roundtrip() {
        let mut stem = StemNode::new([3u8; 31], 5);
        stem.values[0] = Some([1u8; 32]);
        stem.values[255] = Some([2u8; 32]);
        stem.values[17] = Some(ZERO_HASH);

        let bytes = stem.serialize();
        assert_eq!(bytes[0], TAG_STEM);
        assert_eq!(bytes.len(), 64 + 3 * 32);

        let decoded = Node::deserialize(&bytes, 5).unwrap();
        assert_eq!(decoded, Node::Stem(Box::new(stem)));
    }

    #[test]
    fn test_internal_serialize_roundtrip() {
        let stem = Node::Stem(Box::new(StemNode::with_value([4u8; 31], 1, 3, [7u8; 32])));
        let node = Node::Internal {
            left: Box::new(stem.clone()),
            right: Box::new(Node::Empty),
            depth: 0,
        };

        let bytes = node.serialize().unwrap();
        assert_eq!(bytes.len(), 65);

        let decoded = Node::deserialize(&bytes, 0).unwrap();
        match decoded {
            Node::Internal { left, right, depth } => {
                assert_eq!(*left, Node::Hashed(stem.hash()));
                assert_eq!(*right, Node::Empty);
                assert_eq!(depth, 0);
            }
            other => panic!("expected internal node, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_encodings() {
        assert_eq!(Node::deserialize(&[], 0).unwrap(), Node::Empty);
        assert_eq!(Node::deserialize(&[TAG_EMPTY], 0).unwrap(), Node::Empty);
        assert_eq!(Node::Empty.serialize().unwrap(), vec![TAG_EMPTY]);
    }

    #[test]
    fn test_corrupt_encodings_rejected() {
        assert!(Node::deserialize(&[0x07], 0).is_err());
        assert!(Node::deserialize(&[TAG_INTERNAL, 0, 0], 0).is_err());
        // Stem claiming two values but carrying one.
        let mut bytes = vec![TAG_STEM];
        bytes.extend_from_slice(&[0u8; 31]);
        let mut bitmap = [0u8; 32];
        bitmap[0] = 0b1100_0000;
        bytes.extend_from_slice(&bitmap);
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(Node::deserialize(&bytes, 0).is_err());
    }

    #[test]
    fn test_hashed_node_not_serializable() {
        assert!(Node::Hashed([1u8; 32]).serialize().is_err());
    }
}
