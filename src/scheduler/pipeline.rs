use crate::scheduler::SchedulerError;
use ahash::AHashMap;

/// Gas assumed for a task with no hint.
pub const DEFAULT_TASK_GAS: u64 = 21_000;

/// One worker's slice of a wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineBatch {
    pub worker_id: usize,
    pub tasks: Vec<usize>,
    pub gas_sum: u64,
}

/// Pack a wave's tasks into at most `workers` batches, greedily minimizing
/// the maximum gas load: each task goes to the batch with the smallest
/// current `gas_sum` (ties break to the lowest worker id). Batches that end
/// up empty are dropped.
pub fn assign_batches(
    wave: &[usize],
    gas_hints: &AHashMap<usize, u64>,
    workers: usize,
) -> Result<Vec<PipelineBatch>, SchedulerError> {
    if workers == 0 {
        return Err(SchedulerError::WorkerCountInvalid(workers));
    }

    let mut batches: Vec<PipelineBatch> = (0..workers)
        .map(|worker_id| PipelineBatch {
            worker_id,
            tasks: Vec::new(),
            gas_sum: 0,
        })
        .collect();

    for &task in wave {
        let gas = gas_hints.get(&task).copied().unwrap_or(DEFAULT_TASK_GAS);
        let lightest = batches
            .iter_mut()
            .min_by_key(|b| (b.gas_sum, b.worker_id))
            .expect("workers >= 1");
        lightest.tasks.push(task);
        lightest.gas_sum += gas;
    }

    batches.retain(|b| !b.tasks.is_empty());
    Ok(batches)
}

/// Round-robin assignment for when gas is irrelevant: task `i` goes to
/// worker `i % workers`.
pub fn assign_round_robin(
    wave: &[usize],
    workers: usize,
) -> Result<Vec<PipelineBatch>, SchedulerError> {
    if workers == 0 {
        return Err(SchedulerError::WorkerCountInvalid(workers));
    }

    let mut batches: Vec<PipelineBatch> = (0..workers)
        .map(|worker_id| PipelineBatch {
            worker_id,
            tasks: Vec::new(),
            gas_sum: 0,
        })
        .collect();

    for (i, &task) in wave.iter().enumerate() {
        let batch = &mut batches[i % workers];
        batch.tasks.push(task);
        batch.gas_sum += DEFAULT_TASK_GAS;
    }

    batches.retain(|b| !b.tasks.is_empty());
    Ok(batches)
}
