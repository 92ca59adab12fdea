use crate::types::{BlockAccessList, Key, TxRwSet};

/// Fold a block access list into per-transaction read/write sets.
///
/// Entries with `access_index == 0` belong to the pre-execution phase and
/// entries past `tx_count` belong to the post-execution phase; neither
/// participates in tx-vs-tx conflict analysis. The internal transaction
/// index is `access_index - 1`. Entries sharing a transaction index merge
/// into one set.
pub fn extract_rw_sets(bal: &BlockAccessList, tx_count: usize) -> Vec<TxRwSet> {
    let mut sets = vec![TxRwSet::new(); tx_count];

    for entry in &bal.entries {
        if entry.access_index == 0 || entry.access_index as usize > tx_count {
            continue;
        }
        let tx = entry.access_index as usize - 1;
        let set = &mut sets[tx];

        for read in &entry.storage_reads {
            set.add_read(Key::new(entry.address, read.slot));
        }
        for change in &entry.storage_changes {
            set.add_write(Key::new(entry.address, change.slot));
        }
        if entry.has_account_write() {
            set.add_account_write(entry.address);
        }
    }

    tracing::debug!(
        "Extracted {} rw-sets from {} access entries",
        tx_count,
        bal.entries.len()
    );

    sets
}

/// Like [`extract_rw_sets`], inferring the transaction count as the highest
/// access index present. Use only when the list is known to carry no
/// post-execution entry.
pub fn extract_rw_sets_inferred(bal: &BlockAccessList) -> Vec<TxRwSet> {
    extract_rw_sets(bal, bal.max_access_index() as usize)
}
