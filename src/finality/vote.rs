use crate::types::B256;
use ahash::AHashMap;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 commitment a validator signs:
/// `keccak256(block_hash ‖ slot_be ‖ validator_index_be)`.
pub fn signing_data(block_hash: &B256, slot: u64, validator_index: u64) -> B256 {
    let mut hasher = Keccak::v256();
    hasher.update(block_hash);
    hasher.update(&slot.to_be_bytes());
    hasher.update(&validator_index.to_be_bytes());
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// A weighted attestation over a block hash at a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub slot: u64,
    pub validator_index: u64,
    pub block_hash: B256,
    pub weight: u64,
    pub signature: Vec<u8>,
    pub signing_data: B256,
}

impl Vote {
    pub fn new(slot: u64, validator_index: u64, block_hash: B256, weight: u64) -> Self {
        Self {
            slot,
            validator_index,
            block_hash,
            weight,
            signature: Vec::new(),
            signing_data: signing_data(&block_hash, slot, validator_index),
        }
    }

    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }
}

/// Boolean signature predicate consulted before a vote's weight is
/// accounted. Real backends live outside the core.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, vote: &Vote) -> bool;
}

/// Accept-everything backend for tests and simulation.
#[derive(Debug, Default)]
pub struct AcceptAllSignatures;

impl SignatureVerifier for AcceptAllSignatures {
    fn verify(&self, _vote: &Vote) -> bool {
        true
    }
}

/// Validator index to stake weight.
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    weights: AHashMap<u64, u64>,
    total_weight: u64,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` validators of identical weight, indexed from zero.
    pub fn equal_weighted(count: u64, weight: u64) -> Self {
        let mut set = Self::new();
        for index in 0..count {
            set.register(index, weight);
        }
        set
    }

    pub fn register(&mut self, index: u64, weight: u64) {
        let previous = self.weights.insert(index, weight).unwrap_or(0);
        self.total_weight = self.total_weight - previous + weight;
    }

    pub fn weight_of(&self, index: u64) -> Option<u64> {
        self.weights.get(&index).copied()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.weights.contains_key(&index)
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
