//! Inclusion proofs: the stem binding plus sibling hashes root-to-leaf.
//!
//! Verification rebuilds the stem sub-root from the leaf and the eight
//! in-stem siblings, wraps it in the stem commitment, then folds the spine
//! siblings upward following the stem's branch bits.

use crate::trie::node::{sha256, sha256_pair, stem_bit, STEM_LEVELS, ZERO_HASH};
use crate::types::B256;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub key: B256,
    /// The proven value; all-zero proves the slot empty.
    pub value: B256,
    pub stem: [u8; 31],
    pub leaf_index: u8,
    /// Sibling hashes root-to-leaf: first the spine internal siblings,
    /// then the eight in-stem subtree siblings.
    pub siblings: Vec<B256>,
}

pub fn verify_proof(root: &B256, proof: &Proof) -> bool {
    if proof.siblings.len() < STEM_LEVELS {
        return false;
    }
    if proof.key[..31] != proof.stem || proof.key[31] != proof.leaf_index {
        return false;
    }

    let spine_len = proof.siblings.len() - STEM_LEVELS;
    if spine_len > 248 {
        return false;
    }

    // Leaf upward through the stem subtree.
    let mut acc = if proof.value == ZERO_HASH {
        ZERO_HASH
    } else {
        sha256(&proof.value)
    };
    for (level, sibling) in proof.siblings[spine_len..].iter().rev().enumerate() {
        let bit = (proof.leaf_index >> level) & 1;
        acc = if bit == 1 {
            sha256_pair(sibling, &acc)
        } else {
            sha256_pair(&acc, sibling)
        };
    }

    // Stem commitment.
    let mut hasher = Sha256::new();
    hasher.update(proof.stem);
    hasher.update([0u8]);
    hasher.update(acc);
    acc = hasher.finalize().into();

    // Spine upward, branching by stem bits.
    for (i, sibling) in proof.siblings[..spine_len].iter().rev().enumerate() {
        let depth = spine_len - 1 - i;
        let bit = stem_bit(&proof.stem, depth);
        acc = if bit == 1 {
            sha256_pair(sibling, &acc)
        } else {
            sha256_pair(&acc, sibling)
        };
    }

    acc == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::tree::BinaryTrie;

    fn populated_trie() -> (BinaryTrie, Vec<B256>) {
        let mut trie = BinaryTrie::new();
        let mut keys = Vec::new();
        for i in 0..4u8 {
            let mut key = [0u8; 32];
            key[0] = i * 0x40; // spread across the spine
            key[31] = i + 1;
            let mut value = [0u8; 32];
            value[16] = i + 1;
            trie.insert(key, value).unwrap();
            keys.push(key);
        }
        (trie, keys)
    }

    #[test]
    fn test_proofs_verify_for_all_keys() {
        let (mut trie, keys) = populated_trie();
        let root = trie.root_hash();

        for key in &keys {
            let proof = trie.prove(key).unwrap();
            assert!(verify_proof(&root, &proof));
        }
    }

    #[test]
    fn test_mutated_value_fails() {
        let (mut trie, keys) = populated_trie();
        let root = trie.root_hash();

        let mut proof = trie.prove(&keys[0]).unwrap();
        proof.value[5] ^= 0x01;
        assert!(!verify_proof(&root, &proof));
    }

    #[test]
    fn test_mutated_sibling_fails() {
        let (mut trie, keys) = populated_trie();
        let root = trie.root_hash();

        for i in 0..trie.prove(&keys[1]).unwrap().siblings.len() {
            let mut proof = trie.prove(&keys[1]).unwrap();
            proof.siblings[i][31] ^= 0x80;
            assert!(!verify_proof(&root, &proof), "sibling {i} accepted");
        }
    }

    #[test]
    fn test_wrong_root_fails() {
        let (mut trie, keys) = populated_trie();
        let proof = trie.prove(&keys[2]).unwrap();
        let mut wrong_root = trie.root_hash();
        wrong_root[0] ^= 0x01;
        assert!(!verify_proof(&wrong_root, &proof));
    }

    #[test]
    fn test_inconsistent_key_fields_fail() {
        let (mut trie, keys) = populated_trie();
        let root = trie.root_hash();

        let mut proof = trie.prove(&keys[0]).unwrap();
        proof.leaf_index ^= 1;
        assert!(!verify_proof(&root, &proof));

        let mut proof = trie.prove(&keys[0]).unwrap();
        proof.stem[30] ^= 1;
        assert!(!verify_proof(&root, &proof));
    }

    #[test]
    fn test_truncated_proof_fails() {
        let (mut trie, keys) = populated_trie();
        let root = trie.root_hash();

        let mut proof = trie.prove(&keys[0]).unwrap();
        proof.siblings.truncate(4);
        assert!(!verify_proof(&root, &proof));
    }

    #[test]
    fn test_zero_value_proof_for_empty_slot() {
        let mut trie = BinaryTrie::new();
        let mut key = [0u8; 32];
        key[31] = 1;
        trie.insert(key, [7u8; 32]).unwrap();

        // Another slot in the same stem is provably empty.
        let mut empty_slot = key;
        empty_slot[31] = 2;
        let proof = trie.prove(&empty_slot).unwrap();
        assert_eq!(proof.value, ZERO_HASH);
        assert!(verify_proof(&trie.root_hash(), &proof));
    }
}
