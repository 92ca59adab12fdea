//! Supermajority finality: weighted vote aggregation with a strict 2/3
//! stake threshold, first-writer-wins per (slot, validator), and at most
//! one finality event per slot.

pub mod vote;

pub use vote::{signing_data, AcceptAllSignatures, SignatureVerifier, ValidatorSet, Vote};

use crate::types::B256;
use ahash::{AHashMap, AHashSet};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinalityError {
    #[error("validator {0} is not in the validator set")]
    InvalidValidator(u64),
    #[error("validator {validator_index} already voted at slot {slot}")]
    DuplicateVote { slot: u64, validator_index: u64 },
    #[error("slot {0} is already finalized")]
    SlotAlreadyFinalized(u64),
    #[error("vote signature is invalid")]
    InvalidSignature,
    #[error("vote weight must be positive")]
    InvalidWeight,
}

/// Emitted exactly once when a slot crosses the supermajority threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalityEvent {
    pub slot: u64,
    pub block_root: B256,
    pub vote_count: usize,
    pub total_weight: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    tallies: AHashMap<B256, u64>,
    voted: AHashSet<u64>,
    finalized: Option<B256>,
}

/// Vote accounting and finality detection. All state sits behind a single
/// mutex; `submit_vote` is a short critical section.
pub struct FinalityEngine {
    validators: ValidatorSet,
    verifier: Box<dyn SignatureVerifier>,
    slots: Mutex<AHashMap<u64, SlotState>>,
}

impl FinalityEngine {
    pub fn new(validators: ValidatorSet, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self {
            validators,
            verifier,
            slots: Mutex::new(AHashMap::new()),
        }
    }

    /// Engine with the accept-all signature backend, for simulation.
    pub fn unchecked(validators: ValidatorSet) -> Self {
        Self::new(validators, Box::new(AcceptAllSignatures))
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    /// Validate and account one vote. A slot finalizes the moment some
    /// block's accumulated weight strictly exceeds 2/3 of the total stake;
    /// the returned event fires at most once per slot, and every later
    /// vote for that slot is rejected.
    pub fn submit_vote(&self, vote: &Vote) -> Result<Option<FinalityEvent>, FinalityError> {
        if vote.weight == 0 {
            return Err(FinalityError::InvalidWeight);
        }
        if !self.validators.contains(vote.validator_index) {
            return Err(FinalityError::InvalidValidator(vote.validator_index));
        }
        if !self.verifier.verify(vote) {
            return Err(FinalityError::InvalidSignature);
        }

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let state = slots.entry(vote.slot).or_default();

        if state.finalized.is_some() {
            return Err(FinalityError::SlotAlreadyFinalized(vote.slot));
        }
        if state.voted.contains(&vote.validator_index) {
            return Err(FinalityError::DuplicateVote {
                slot: vote.slot,
                validator_index: vote.validator_index,
            });
        }

        state.voted.insert(vote.validator_index);
        let tally = state.tallies.entry(vote.block_hash).or_insert(0);
        *tally += vote.weight;

        let total = self.validators.total_weight();
        if 3 * (*tally as u128) > 2 * (total as u128) {
            state.finalized = Some(vote.block_hash);
            let event = FinalityEvent {
                slot: vote.slot,
                block_root: vote.block_hash,
                vote_count: state.voted.len(),
                total_weight: total,
            };
            tracing::info!(
                "Slot {} finalized with {} votes ({} of {} weight)",
                vote.slot,
                event.vote_count,
                *tally,
                total
            );
            return Ok(Some(event));
        }

        Ok(None)
    }

    pub fn finalized(&self, slot: u64) -> Option<B256> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&slot)
            .and_then(|s| s.finalized)
    }

    pub fn is_finalized(&self, slot: u64) -> bool {
        self.finalized(slot).is_some()
    }

    pub fn tally(&self, slot: u64, block_hash: &B256) -> u64 {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&slot)
            .and_then(|s| s.tallies.get(block_hash).copied())
            .unwrap_or(0)
    }

    pub fn finalized_slots(&self) -> Vec<u64> {
        let mut slots: Vec<u64> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, s)| s.finalized.is_some())
            .map(|(&slot, _)| slot)
            .collect();
        slots.sort_unstable();
        slots
    }
}
