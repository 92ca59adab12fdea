use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 20-byte account address.
pub type Address = [u8; 20];

/// 32-byte word: storage slots, values, hashes.
pub type B256 = [u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub address: Address,
    pub slot: B256,
}

impl Key {
    pub fn new(address: Address, slot: B256) -> Self {
        Self { address, slot }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{}:0x{}",
            hex::encode(self.address),
            hex::encode(self.slot)
        )
    }
}

/// A storage read recorded by the access list: the slot and the value seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRead {
    pub slot: B256,
    pub value: B256,
}

/// A storage write recorded by the access list: old and new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChange {
    pub slot: B256,
    pub old: B256,
    pub new: B256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub old: B256,
    pub new: B256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceChange {
    pub old: u64,
    pub new: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    pub old: Vec<u8>,
    pub new: Vec<u8>,
}

/// One record of the block access list: everything one address saw or did
/// at one access index.
///
/// `access_index = 0` is the pre-execution phase, `1..=n` is transaction
/// `n - 1` (1-based on the wire, 0-based internally), `n + 1` is the
/// post-execution phase. Multiple entries may share `(address, access_index)`;
/// they merge into a single per-tx read/write set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub address: Address,
    pub access_index: u64,
    pub storage_reads: Vec<SlotRead>,
    pub storage_changes: Vec<SlotChange>,
    pub balance_change: Option<BalanceChange>,
    pub nonce_change: Option<NonceChange>,
    pub code_change: Option<CodeChange>,
}

impl AccessEntry {
    pub fn new(address: Address, access_index: u64) -> Self {
        Self {
            address,
            access_index,
            storage_reads: Vec::new(),
            storage_changes: Vec::new(),
            balance_change: None,
            nonce_change: None,
            code_change: None,
        }
    }

    /// True if this entry modifies account-level state (balance, nonce or code).
    pub fn has_account_write(&self) -> bool {
        self.balance_change.is_some() || self.nonce_change.is_some() || self.code_change.is_some()
    }
}

/// Ordered sequence of access entries for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAccessList {
    pub entries: Vec<AccessEntry>,
}

impl BlockAccessList {
    pub fn new(entries: Vec<AccessEntry>) -> Self {
        Self { entries }
    }

    /// Highest transaction index implied by the entries, counting only the
    /// transaction range (`access_index >= 1`).
    pub fn max_access_index(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.access_index)
            .max()
            .unwrap_or(0)
    }
}

/// Per-transaction read/write set, the unit conflict detection works on.
///
/// `account_writes` records addresses whose balance, nonce or code the
/// transaction modified; slot-level sets cover storage.
#[derive(Debug, Clone, Default)]
pub struct TxRwSet {
    pub reads: AHashSet<Key>,
    pub writes: AHashSet<Key>,
    pub account_writes: AHashSet<Address>,
}

impl TxRwSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, key: Key) {
        self.reads.insert(key);
    }

    pub fn add_write(&mut self, key: Key) {
        self.writes.insert(key);
    }

    pub fn add_account_write(&mut self, address: Address) {
        self.account_writes.insert(address);
    }

    pub fn merge(&mut self, other: &TxRwSet) {
        self.reads.extend(&other.reads);
        self.writes.extend(&other.writes);
        self.account_writes.extend(&other.account_writes);
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty() && self.account_writes.is_empty()
    }

    /// Slot- or account-level overlap that forbids parallel execution.
    pub fn has_conflict_with(&self, other: &TxRwSet) -> bool {
        !self.writes.is_disjoint(&other.writes)
            || !self.writes.is_disjoint(&other.reads)
            || !self.reads.is_disjoint(&other.writes)
            || !self.account_writes.is_disjoint(&other.account_writes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    ReadWrite,
    WriteRead,
    WriteWrite,
    AccountLevel,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::ReadWrite => write!(f, "read-write"),
            ConflictKind::WriteRead => write!(f, "write-read"),
            ConflictKind::WriteWrite => write!(f, "write-write"),
            ConflictKind::AccountLevel => write!(f, "account-level"),
        }
    }
}

/// One detected conflict between two transactions, `tx_a < tx_b`.
/// Slot-level kinds carry the slot; account-level conflicts do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Conflict {
    pub tx_a: usize,
    pub tx_b: usize,
    pub kind: ConflictKind,
    pub address: Address,
    pub slot: Option<B256>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx{} <-> tx{} {} @ 0x{}",
            self.tx_a,
            self.tx_b,
            self.kind,
            hex::encode(self.address)
        )?;
        if let Some(slot) = &self.slot {
            write!(f, ":0x{}", hex::encode(slot))?;
        }
        Ok(())
    }
}
