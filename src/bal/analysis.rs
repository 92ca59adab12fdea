use crate::bal::DependencyGraph;
use crate::types::{Address, Conflict, TxRwSet};
use ahash::AHashMap;
use std::collections::VecDeque;

/// An address ranked by how many conflicts it participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotSpot {
    pub address: Address,
    pub conflict_count: usize,
}

/// Off-critical-path analytics over a block's conflict structure.
#[derive(Debug, Clone)]
pub struct BalAnalysis {
    tx_count: usize,
    conflicts: Vec<Conflict>,
}

impl BalAnalysis {
    pub fn new(tx_count: usize, conflicts: Vec<Conflict>) -> Self {
        Self { tx_count, conflicts }
    }

    /// Connected components of the undirected conflict graph, by BFS.
    /// Component ids are assigned in ascending order of their smallest
    /// member, and members are sorted.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.tx_count];
        for c in &self.conflicts {
            adjacency[c.tx_a].push(c.tx_b);
            adjacency[c.tx_b].push(c.tx_a);
        }

        let mut visited = vec![false; self.tx_count];
        let mut clusters = Vec::new();

        for start in 0..self.tx_count {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &next in &adjacency[node] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            clusters.push(component);
        }

        clusters
    }

    /// Addresses by descending conflict participation. Ties break on the
    /// address bytes so the ranking is stable.
    pub fn hot_spots(&self) -> Vec<HotSpot> {
        let mut counts: AHashMap<Address, usize> = AHashMap::new();
        for c in &self.conflicts {
            *counts.entry(c.address).or_default() += 1;
        }

        let mut spots: Vec<HotSpot> = counts
            .into_iter()
            .map(|(address, conflict_count)| HotSpot {
                address,
                conflict_count,
            })
            .collect();
        spots.sort_unstable_by(|a, b| {
            b.conflict_count
                .cmp(&a.conflict_count)
                .then(a.address.cmp(&b.address))
        });
        spots
    }

    /// Suggested execution order: shallow-dependency transactions first,
    /// grouped by cluster, original order as the final tiebreak.
    pub fn reorder_suggestion(&self) -> Vec<usize> {
        let graph = DependencyGraph::from_conflicts(self.tx_count, &self.conflicts);
        let depths = graph.depths();

        let mut cluster_of = vec![0usize; self.tx_count];
        for (cluster_id, members) in self.clusters().iter().enumerate() {
            for &tx in members {
                cluster_of[tx] = cluster_id;
            }
        }

        let mut order: Vec<usize> = (0..self.tx_count).collect();
        order.sort_by_key(|&tx| (depths[tx], cluster_of[tx], tx));
        order
    }

    /// Fraction of transaction pairs free to run in parallel. `1.0` for
    /// fewer than two transactions or a conflict-free block.
    pub fn parallelism_score(rw_sets: &[TxRwSet]) -> f64 {
        let n = rw_sets.len();
        if n <= 1 {
            return 1.0;
        }

        let total_pairs = n * (n - 1) / 2;
        let mut independent = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                if !rw_sets[i].has_conflict_with(&rw_sets[j]) {
                    independent += 1;
                }
            }
        }

        if independent == total_pairs {
            1.0
        } else {
            independent as f64 / total_pairs as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConflictKind, Key};

    fn conflict(a: usize, b: usize, addr: u8) -> Conflict {
        Conflict {
            tx_a: a,
            tx_b: b,
            kind: ConflictKind::WriteWrite,
            address: [addr; 20],
            slot: Some([0u8; 32]),
        }
    }

    fn rw(reads: &[Key], writes: &[Key]) -> TxRwSet {
        let mut set = TxRwSet::new();
        for k in reads {
            set.add_read(*k);
        }
        for k in writes {
            set.add_write(*k);
        }
        set
    }

    #[test]
    fn test_clusters() {
        // {0,1,2} chained, {3} alone, {4,5} paired.
        let analysis = BalAnalysis::new(
            6,
            vec![conflict(0, 1, 1), conflict(1, 2, 1), conflict(4, 5, 2)],
        );
        let clusters = analysis.clusters();
        assert_eq!(clusters, vec![vec![0, 1, 2], vec![3], vec![4, 5]]);
    }

    #[test]
    fn test_hot_spots_descending() {
        let analysis = BalAnalysis::new(
            4,
            vec![conflict(0, 1, 5), conflict(1, 2, 5), conflict(2, 3, 9)],
        );
        let spots = analysis.hot_spots();
        assert_eq!(spots[0].address, [5u8; 20]);
        assert_eq!(spots[0].conflict_count, 2);
        assert_eq!(spots[1].conflict_count, 1);
    }

    #[test]
    fn test_reorder_prefers_shallow_depth() {
        // 1 depends on 0, 3 depends on 2; 4 free.
        let analysis = BalAnalysis::new(5, vec![conflict(0, 1, 1), conflict(2, 3, 2)]);
        let order = analysis.reorder_suggestion();
        // Depth-0 txs first (cluster, then index), then the depth-1 ones.
        assert_eq!(order, vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn test_parallelism_score() {
        let k = Key::new([1u8; 20], [1u8; 32]);
        assert_eq!(BalAnalysis::parallelism_score(&[]), 1.0);
        assert_eq!(BalAnalysis::parallelism_score(&[rw(&[], &[k])]), 1.0);

        // Two conflicting txs: no independent pair.
        let score = BalAnalysis::parallelism_score(&[rw(&[], &[k]), rw(&[k], &[])]);
        assert_eq!(score, 0.0);

        // One conflicting pair out of three.
        let free = Key::new([2u8; 20], [2u8; 32]);
        let score = BalAnalysis::parallelism_score(&[
            rw(&[], &[k]),
            rw(&[k], &[]),
            rw(&[], &[free]),
        ]);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }
}
