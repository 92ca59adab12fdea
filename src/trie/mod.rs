pub mod cache;
pub mod chunk;
pub mod key;
pub mod node;
pub mod proof;
pub mod store;
pub mod tree;

pub use cache::MerkleCache;
pub use chunk::{chunkify_code, merge_chunks};
pub use key::{
    basic_data_key, code_chunk_key, code_hash_key, pack_basic_data, storage_slot_key, tree_key,
    unpack_basic_data,
};
pub use node::{Node, StemNode};
pub use proof::{verify_proof, Proof};
pub use store::{MemoryNodeStore, NodeSink, NodeSource};
pub use tree::BinaryTrie;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("hashed subtree cannot be descended without a resolver")]
    UnresolvedNode,
    #[error("node resolution failed: {0}")]
    ResolveFailed(String),
    #[error("corrupt node encoding: {0}")]
    CorruptNode(String),
    #[error("no stem exists for the requested key")]
    StemNotFound,
}
