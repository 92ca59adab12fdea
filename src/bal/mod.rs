pub mod analysis;
pub mod conflicts;
pub mod graph;
pub mod rw_sets;
pub mod wire;

pub use analysis::{BalAnalysis, HotSpot};
pub use conflicts::{ConflictDetector, ResolutionAction, ResolutionStrategy, TxAction};
pub use graph::DependencyGraph;
pub use rw_sets::{extract_rw_sets, extract_rw_sets_inferred};
pub use wire::{decode_bal, encode_bal};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalError {
    #[error("rlp: {0}")]
    Rlp(String),
}
