use rayon::prelude::*;
use thiserror::Error;

/// Per-task failures surfaced by the external executor. They never abort a
/// wave; each lands in the owning task's result record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("task cancelled")]
    Cancelled,
    #[error("execution failed: {0}")]
    Failed(String),
}

/// The external transaction executor the scheduler drives. Implementations
/// own the EVM semantics and state access; the scheduler only cares about
/// gas and success.
pub trait TxExecutor: Send + Sync {
    fn execute(&self, tx_index: usize) -> Result<u64, ExecutionError>;
}

/// Outcome of one speculative task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeculativeResult {
    pub tx_index: usize,
    pub gas_used: u64,
    pub success: bool,
    pub rolled: bool,
    pub re_executed: bool,
    pub error: Option<String>,
}

impl SpeculativeResult {
    fn from_outcome(tx_index: usize, outcome: Result<u64, ExecutionError>) -> Self {
        match outcome {
            Ok(gas_used) => Self {
                tx_index,
                gas_used,
                success: true,
                rolled: false,
                re_executed: false,
                error: None,
            },
            Err(err) => Self {
                tx_index,
                gas_used: 0,
                success: false,
                rolled: false,
                re_executed: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Optimistically run every task of a wave in parallel and join before
/// returning. Within the wave, no ordering is guaranteed or required; the
/// tasks are conflict-free by construction. Results come back in wave
/// order.
pub fn execute_wave(executor: &dyn TxExecutor, wave: &[usize]) -> Vec<SpeculativeResult> {
    wave.par_iter()
        .map(|&tx_index| {
            let result = SpeculativeResult::from_outcome(tx_index, executor.execute(tx_index));
            tracing::trace!(
                "Speculative tx {}: success={} gas={}",
                tx_index,
                result.success,
                result.gas_used
            );
            result
        })
        .collect()
}

/// Mark the dynamically-conflicted tasks rolled back. Returns how many
/// results were newly rolled.
pub fn apply_rollbacks(results: &mut [SpeculativeResult], conflicted: &[usize]) -> usize {
    let mut rolled = 0;
    for result in results.iter_mut() {
        if conflicted.contains(&result.tx_index) && !result.rolled {
            result.rolled = true;
            result.success = false;
            rolled += 1;
        }
    }
    rolled
}

/// Sequentially re-run every rolled-back task with fresh gas accounting.
/// Returns how many tasks were re-executed.
pub fn re_execute(executor: &dyn TxExecutor, results: &mut [SpeculativeResult]) -> usize {
    let mut rerun = 0;
    for result in results.iter_mut() {
        if !result.rolled || result.re_executed {
            continue;
        }
        match executor.execute(result.tx_index) {
            Ok(gas_used) => {
                result.gas_used = gas_used;
                result.success = true;
                result.error = None;
            }
            Err(err) => {
                result.gas_used = 0;
                result.success = false;
                result.error = Some(err.to_string());
            }
        }
        result.re_executed = true;
        rerun += 1;
    }
    rerun
}
