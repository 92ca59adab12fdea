use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters the scheduler updates as it works.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    waves_formed: AtomicU64,
    txs_scheduled: AtomicU64,
    rollbacks: AtomicU64,
    re_executions: AtomicU64,
    max_wave_size: AtomicU64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_schedule(&self, waves: &[Vec<usize>]) {
        let txs: usize = waves.iter().map(|w| w.len()).sum();
        let largest = waves.iter().map(|w| w.len()).max().unwrap_or(0);

        self.waves_formed
            .fetch_add(waves.len() as u64, Ordering::Relaxed);
        self.txs_scheduled.fetch_add(txs as u64, Ordering::Relaxed);
        self.max_wave_size
            .fetch_max(largest as u64, Ordering::AcqRel);
    }

    pub fn record_rollbacks(&self, count: u64) {
        self.rollbacks.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_re_executions(&self, count: u64) {
        self.re_executions.fetch_add(count, Ordering::Relaxed);
    }

    /// Scheduled transactions per wave; 1.0 when nothing ran yet.
    pub fn parallelism_ratio(&self) -> f64 {
        let waves = self.waves_formed.load(Ordering::Relaxed);
        let txs = self.txs_scheduled.load(Ordering::Relaxed);
        if waves == 0 {
            1.0
        } else {
            txs as f64 / waves as f64
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            waves_formed: self.waves_formed.load(Ordering::Relaxed),
            txs_scheduled: self.txs_scheduled.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            re_executions: self.re_executions.load(Ordering::Relaxed),
            max_wave_size: self.max_wave_size.load(Ordering::Relaxed),
            parallelism_ratio: self.parallelism_ratio(),
            exported_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Point-in-time view of the counters, exportable as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub waves_formed: u64,
    pub txs_scheduled: u64,
    pub rollbacks: u64,
    pub re_executions: u64,
    pub max_wave_size: u64,
    pub parallelism_ratio: f64,
    pub exported_at: String,
}

impl MetricsSnapshot {
    pub fn export_json(&self, path: &str) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn print(&self) {
        tracing::info!("Scheduler metrics:");
        tracing::info!("  Waves formed: {}", self.waves_formed);
        tracing::info!("  Txs scheduled: {}", self.txs_scheduled);
        tracing::info!("  Rollbacks: {}", self.rollbacks);
        tracing::info!("  Re-executions: {}", self.re_executions);
        tracing::info!("  Max wave size: {}", self.max_wave_size);
        tracing::info!("  Parallelism ratio: {:.3}", self.parallelism_ratio);
    }
}
