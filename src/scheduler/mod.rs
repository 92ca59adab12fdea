pub mod metrics;
pub mod pipeline;
pub mod speculative;
pub mod waves;

pub use metrics::{MetricsSnapshot, SchedulerMetrics};
pub use pipeline::{assign_batches, assign_round_robin, PipelineBatch, DEFAULT_TASK_GAS};
pub use speculative::{
    apply_rollbacks, execute_wave, re_execute, ExecutionError, SpeculativeResult, TxExecutor,
};
pub use waves::{color_batches, form_waves, topo_order};

use crate::bal::{ConflictDetector, DependencyGraph};
use crate::types::{Conflict, TxRwSet};
use thiserror::Error;

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no transactions to schedule")]
    NoTransactions,
    #[error("dependency graph contains a cycle")]
    CyclicDependency,
    #[error("worker count must be at least 1, got {0}")]
    WorkerCountInvalid(usize),
}

/// Everything `schedule` derives from a block's read/write sets.
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub conflicts: Vec<Conflict>,
    pub graph: DependencyGraph,
    pub waves: Vec<Vec<usize>>,
}

/// Reports transactions that turned out to conflict at runtime despite the
/// static analysis. Lives outside this component; the scheduler only
/// consumes the index set.
pub trait DynamicConflicts: Send + Sync {
    fn detect(&self, wave: &[usize], results: &[SpeculativeResult]) -> Vec<usize>;
}

/// Block-level scheduler: BAL conflicts in, executed waves out.
///
/// `schedule` runs under a single mutex to keep metric updates coherent;
/// wave execution itself only reads shared state and writes disjoint result
/// slots, so it needs nothing beyond the atomic counters.
#[derive(Debug)]
pub struct BalScheduler {
    workers: usize,
    detector: ConflictDetector,
    metrics: SchedulerMetrics,
    schedule_lock: Mutex<()>,
}

impl BalScheduler {
    pub fn new(workers: usize) -> Result<Self, SchedulerError> {
        if workers == 0 {
            return Err(SchedulerError::WorkerCountInvalid(workers));
        }
        Ok(Self {
            workers,
            detector: ConflictDetector::default(),
            metrics: SchedulerMetrics::new(),
            schedule_lock: Mutex::new(()),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Detect conflicts, build the dependency graph and lay transactions
    /// into waves. Empty input produces an empty plan, never an error.
    pub fn schedule(&self, rw_sets: &[TxRwSet]) -> Result<SchedulePlan, SchedulerError> {
        let _guard = self
            .schedule_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let conflicts = self.detector.detect(rw_sets);
        let graph = DependencyGraph::from_conflicts(rw_sets.len(), &conflicts);
        let waves = form_waves(&graph)?;

        self.metrics.record_schedule(&waves);

        tracing::info!(
            "Scheduled {} txs into {} waves ({} conflicts)",
            rw_sets.len(),
            waves.len(),
            conflicts.len()
        );

        Ok(SchedulePlan {
            conflicts,
            graph,
            waves,
        })
    }

    /// Drive a whole block: schedule, then execute wave by wave. Wave `k`
    /// fully completes, including any re-execution of rolled-back tasks,
    /// before wave `k + 1` dispatches.
    pub fn run_block(
        &self,
        executor: &dyn TxExecutor,
        rw_sets: &[TxRwSet],
        dynamic: Option<&dyn DynamicConflicts>,
    ) -> Result<Vec<SpeculativeResult>, SchedulerError> {
        if rw_sets.is_empty() {
            return Err(SchedulerError::NoTransactions);
        }

        let plan = self.schedule(rw_sets)?;
        let mut all_results = Vec::with_capacity(rw_sets.len());

        for (wave_idx, wave) in plan.waves.iter().enumerate() {
            tracing::debug!("Executing wave {} with {} tasks", wave_idx, wave.len());
            let mut results = execute_wave(executor, wave);

            if let Some(detector) = dynamic {
                let conflicted = detector.detect(wave, &results);
                if !conflicted.is_empty() {
                    tracing::warn!(
                        "Wave {}: rolling back {} conflicted txs",
                        wave_idx,
                        conflicted.len()
                    );
                    let rolled = apply_rollbacks(&mut results, &conflicted);
                    self.metrics.record_rollbacks(rolled as u64);
                    let rerun = re_execute(executor, &mut results);
                    self.metrics.record_re_executions(rerun as u64);
                }
            }

            all_results.extend(results);
        }

        Ok(all_results)
    }
}
