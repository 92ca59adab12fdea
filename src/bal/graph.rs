use crate::types::Conflict;

/// Transaction dependency DAG built from a conflict set.
///
/// `preds[i]` lists the transactions that must finish before `i` may run.
/// Every conflict `(a, b)` with `a < b` contributes the edge `b -> a`, so
/// edges always point from a higher to a lower transaction index and the
/// graph is acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    preds: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new(tx_count: usize) -> Self {
        Self {
            preds: vec![Vec::new(); tx_count],
        }
    }

    pub fn from_conflicts(tx_count: usize, conflicts: &[Conflict]) -> Self {
        let mut graph = Self::new(tx_count);
        for conflict in conflicts {
            graph.add_dependency(conflict.tx_b, conflict.tx_a);
        }
        for preds in &mut graph.preds {
            preds.sort_unstable();
            preds.dedup();
        }
        graph
    }

    /// Record that `node` depends on `pred`. At most one edge per ordered
    /// pair survives `from_conflicts`; direct calls dedup on read.
    pub fn add_dependency(&mut self, node: usize, pred: usize) {
        debug_assert!(pred < node, "edges must point to lower tx indices");
        self.preds[node].push(pred);
    }

    pub fn node_count(&self) -> usize {
        self.preds.len()
    }

    pub fn edge_count(&self) -> usize {
        self.preds.iter().map(|p| p.len()).sum()
    }

    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.preds[node]
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    /// Reverse adjacency: for each node, the nodes that depend on it.
    /// Materialized at query time; the forward lists stay canonical.
    pub fn dependents(&self) -> Vec<Vec<usize>> {
        let mut deps = vec![Vec::new(); self.preds.len()];
        for (node, preds) in self.preds.iter().enumerate() {
            for &pred in preds {
                deps[pred].push(node);
            }
        }
        for list in &mut deps {
            list.sort_unstable();
        }
        deps
    }

    /// Dependency depth per node: 0 for roots, otherwise
    /// `1 + max(depth of predecessors)`. Valid because edges only point to
    /// lower indices, so a single ascending pass suffices.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![0usize; self.preds.len()];
        for node in 0..self.preds.len() {
            depths[node] = self.preds[node]
                .iter()
                .map(|&p| depths[p] + 1)
                .max()
                .unwrap_or(0);
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConflictKind;

    fn conflict(a: usize, b: usize) -> Conflict {
        Conflict {
            tx_a: a,
            tx_b: b,
            kind: ConflictKind::WriteWrite,
            address: [0u8; 20],
            slot: Some([0u8; 32]),
        }
    }

    #[test]
    fn test_edges_deduplicated() {
        // Two conflicts on the same pair collapse into one edge.
        let graph = DependencyGraph::from_conflicts(3, &[conflict(0, 2), conflict(0, 2)]);
        assert_eq!(graph.predecessors(2), &[0]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_predecessors_sorted() {
        let graph =
            DependencyGraph::from_conflicts(4, &[conflict(2, 3), conflict(0, 3), conflict(1, 3)]);
        assert_eq!(graph.predecessors(3), &[0, 1, 2]);
    }

    #[test]
    fn test_dependents_reverse() {
        let graph = DependencyGraph::from_conflicts(3, &[conflict(0, 1), conflict(0, 2)]);
        let deps = graph.dependents();
        assert_eq!(deps[0], vec![1, 2]);
        assert!(deps[1].is_empty());
    }

    #[test]
    fn test_depths() {
        // 1 -> 0, 2 -> 1 forms a chain; 3 is independent.
        let graph = DependencyGraph::from_conflicts(4, &[conflict(0, 1), conflict(1, 2)]);
        assert_eq!(graph.depths(), vec![0, 1, 2, 0]);
    }
}
