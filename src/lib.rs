//! Parallel block processing core: block-access-list conflict analysis and
//! wave scheduling, a SHA-256 binary state trie, a GF(2⁸) Reed-Solomon
//! codec for data availability, and supermajority finality voting.

pub mod bal;
pub mod codec;
pub mod finality;
pub mod generator;
pub mod scheduler;
pub mod trie;
pub mod types;

// Re-export commonly used types
pub use types::{
    AccessEntry, Address, BlockAccessList, Conflict, ConflictKind, Key, TxRwSet, B256,
};

pub use bal::{
    extract_rw_sets, extract_rw_sets_inferred, BalAnalysis, ConflictDetector, DependencyGraph,
    ResolutionStrategy,
};
pub use codec::{GaloisField, ReedSolomon};
pub use finality::{FinalityEngine, FinalityEvent, ValidatorSet, Vote};
pub use generator::{BalGenerator, SimExecutor};
pub use scheduler::{
    BalScheduler, PipelineBatch, SchedulePlan, SchedulerMetrics, SpeculativeResult, TxExecutor,
};
pub use trie::{BinaryTrie, MerkleCache, Proof};
