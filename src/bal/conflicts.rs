use crate::types::{Conflict, ConflictKind, Key, TxRwSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// What to do with the later transaction of a conflicting pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStrategy {
    #[default]
    Serialize,
    Abort,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAction {
    Execute,
    Serialize,
    Abort,
    Retry,
}

/// Per-transaction action derived from a conflict under the active strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionAction {
    pub tx_index: usize,
    pub action: TxAction,
}

/// Detects pairwise conflicts between transaction read/write sets.
///
/// The resolution strategy is shared mutable state: reads are concurrent,
/// swaps are exclusive. Counters are atomic so detection can run from
/// multiple threads without a lock.
#[derive(Debug)]
pub struct ConflictDetector {
    strategy: RwLock<ResolutionStrategy>,
    pairs_checked: AtomicU64,
    conflicts_found: AtomicU64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(ResolutionStrategy::Serialize)
    }
}

impl ConflictDetector {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            pairs_checked: AtomicU64::new(0),
            conflicts_found: AtomicU64::new(0),
        }
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        *self
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_strategy(&self, strategy: ResolutionStrategy) {
        *self
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = strategy;
    }

    pub fn pairs_checked(&self) -> u64 {
        self.pairs_checked.load(Ordering::Relaxed)
    }

    pub fn conflicts_found(&self) -> u64 {
        self.conflicts_found.load(Ordering::Relaxed)
    }

    /// Enumerate every conflict between every ordered pair `i < j`.
    ///
    /// One pair may emit several conflicts (different slots, different
    /// kinds). The output is sorted by `(tx_a, tx_b, kind, address, slot)`,
    /// so the result is a deterministic function of the sets regardless of
    /// the order the access entries arrived in.
    pub fn detect(&self, rw_sets: &[TxRwSet]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for i in 0..rw_sets.len() {
            for j in (i + 1)..rw_sets.len() {
                self.pairs_checked.fetch_add(1, Ordering::Relaxed);
                Self::pair_conflicts(i, j, &rw_sets[i], &rw_sets[j], &mut conflicts);
            }
        }

        conflicts.sort_unstable();
        conflicts.dedup();
        self.conflicts_found
            .fetch_add(conflicts.len() as u64, Ordering::Relaxed);

        tracing::debug!(
            "Conflict detection: {} txs, {} conflicts",
            rw_sets.len(),
            conflicts.len()
        );

        conflicts
    }

    fn pair_conflicts(
        i: usize,
        j: usize,
        a: &TxRwSet,
        b: &TxRwSet,
        out: &mut Vec<Conflict>,
    ) {
        let slot_conflict = |key: &Key, kind: ConflictKind| Conflict {
            tx_a: i,
            tx_b: j,
            kind,
            address: key.address,
            slot: Some(key.slot),
        };

        for key in a.writes.intersection(&b.writes) {
            out.push(slot_conflict(key, ConflictKind::WriteWrite));
        }
        for key in a.reads.intersection(&b.writes) {
            out.push(slot_conflict(key, ConflictKind::ReadWrite));
        }
        for key in a.writes.intersection(&b.reads) {
            out.push(slot_conflict(key, ConflictKind::WriteRead));
        }
        for addr in a.account_writes.intersection(&b.account_writes) {
            out.push(Conflict {
                tx_a: i,
                tx_b: j,
                kind: ConflictKind::AccountLevel,
                address: *addr,
                slot: None,
            });
        }
    }

    /// Parallel execution is worthwhile when at least two transactions exist
    /// and at least one pair of them is conflict-free.
    pub fn parallel_feasible(&self, rw_sets: &[TxRwSet]) -> bool {
        if rw_sets.len() < 2 {
            return false;
        }
        for i in 0..rw_sets.len() {
            for j in (i + 1)..rw_sets.len() {
                if !rw_sets[i].has_conflict_with(&rw_sets[j]) {
                    return true;
                }
            }
        }
        false
    }

    /// Map conflicts to per-transaction actions under the active strategy:
    /// the earlier transaction executes, the later one is serialized,
    /// aborted or retried.
    pub fn resolve(&self, conflicts: &[Conflict]) -> Vec<ResolutionAction> {
        let later_action = match self.strategy() {
            ResolutionStrategy::Serialize => TxAction::Serialize,
            ResolutionStrategy::Abort => TxAction::Abort,
            ResolutionStrategy::Retry => TxAction::Retry,
        };

        let mut actions = Vec::with_capacity(conflicts.len() * 2);
        for conflict in conflicts {
            actions.push(ResolutionAction {
                tx_index: conflict.tx_a,
                action: TxAction::Execute,
            });
            actions.push(ResolutionAction {
                tx_index: conflict.tx_b,
                action: later_action,
            });
        }
        actions
    }
}
