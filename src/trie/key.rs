//! SHA-256 tree-key derivation, EIP-7864 aligned.
//!
//! A 32-byte tree key splits into a 31-byte stem and a one-byte leaf index.
//! All keys for one account share the hash input layout
//! `0x00×12 ‖ address ‖ index[..31] ‖ 0x00`, with the output's final byte
//! overwritten by `index[31]`; the layout is bit-exact across
//! implementations.

use crate::types::{Address, B256};
use sha2::{Digest, Sha256};

/// Leaf index of the packed basic-data record.
pub const BASIC_DATA_LEAF: u8 = 0;
/// Leaf index of the code hash.
pub const CODE_HASH_LEAF: u8 = 1;
/// Header slots below this bound live in the account header stem.
pub const HEADER_STORAGE_OFFSET: u8 = 64;
/// First leaf index used for chunked code.
pub const CODE_OFFSET: u64 = 128;

pub fn tree_key(address: &Address, index: &B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update([0u8; 12]);
    hasher.update(address);
    hasher.update(&index[..31]);
    hasher.update([0u8]);

    let mut out: B256 = hasher.finalize().into();
    out[31] = index[31];
    out
}

pub fn basic_data_key(address: &Address) -> B256 {
    let mut index = [0u8; 32];
    index[31] = BASIC_DATA_LEAF;
    tree_key(address, &index)
}

pub fn code_hash_key(address: &Address) -> B256 {
    let mut index = [0u8; 32];
    index[31] = CODE_HASH_LEAF;
    tree_key(address, &index)
}

/// Storage key for a slot. Header slots (`slot[..31]` zero and
/// `slot[31] < 64`) fold into the account header stem at `slot[31] + 64`;
/// everything else is offset by the main-storage base `1 << 248`.
pub fn storage_slot_key(address: &Address, slot: &B256) -> B256 {
    let mut index = *slot;
    if slot[..31].iter().all(|&b| b == 0) && slot[31] < HEADER_STORAGE_OFFSET {
        index[31] += HEADER_STORAGE_OFFSET;
    } else {
        index[0] = index[0].wrapping_add(1);
    }
    tree_key(address, &index)
}

/// Key of code chunk `chunk_index`. The first 128 chunks share the account
/// header stem; later chunks spill into neighbouring stems as the index
/// grows past one byte.
pub fn code_chunk_key(address: &Address, chunk_index: u64) -> B256 {
    let position = CODE_OFFSET + chunk_index;
    let mut index = [0u8; 32];
    index[24..32].copy_from_slice(&position.to_be_bytes());
    tree_key(address, &index)
}

/// Pack the 32-byte basic-data record:
/// `[reserved:4 | code_size:4 | nonce:8 | balance:16]`, big-endian.
pub fn pack_basic_data(code_size: u32, nonce: u64, balance: u128) -> B256 {
    let mut out = [0u8; 32];
    out[4..8].copy_from_slice(&code_size.to_be_bytes());
    out[8..16].copy_from_slice(&nonce.to_be_bytes());
    out[16..32].copy_from_slice(&balance.to_be_bytes());
    out
}

/// Inverse of [`pack_basic_data`].
pub fn unpack_basic_data(data: &B256) -> (u32, u64, u128) {
    let code_size = u32::from_be_bytes(data[4..8].try_into().expect("4 bytes"));
    let nonce = u64::from_be_bytes(data[8..16].try_into().expect("8 bytes"));
    let balance = u128::from_be_bytes(data[16..32].try_into().expect("16 bytes"));
    (code_size, nonce, balance)
}
