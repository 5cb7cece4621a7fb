//! Cycle orchestration
//!
//! A cycle partitions the key set, spawns one task per shard and joins all
//! of them. Worker failures are collected, never propagated to siblings.
//! In forever mode cycles repeat over the same key set until cancelled.

use futures_util::future::join_all;
use log::{error, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::error::WorkerError;
use crate::transfer::{partition, run_worker, TransferRunner, WorkerReport};

#[derive(Debug, Default)]
pub struct CycleReport {
    pub processed: u64,
    pub bytes: u64,
    pub skipped: u64,
    pub errors: Vec<WorkerError>,
    pub cancelled: bool,
}

impl CycleReport {
    fn absorb(&mut self, report: WorkerReport) {
        let worker = report.worker;
        self.processed += report.processed as u64;
        self.bytes += report.bytes;
        self.skipped += report.skipped as u64;
        self.cancelled |= report.cancelled;
        self.errors.extend(
            report
                .errors
                .into_iter()
                .map(|error| WorkerError::Transfer { worker, error }),
        );
    }
}

/// Totals over every completed cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub processed: u64,
    pub bytes: u64,
    pub skipped: u64,
    pub errors: u64,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn failed(&self) -> bool {
        self.errors > 0
    }

    fn absorb(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.processed += report.processed;
        self.bytes += report.bytes;
        self.skipped += report.skipped;
        self.errors += report.errors.len() as u64;
        self.cancelled |= report.cancelled;
    }
}

pub struct Orchestrator {
    runner: Arc<TransferRunner>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(runner: Arc<TransferRunner>, config: RunConfig) -> Self {
        Self { runner, config }
    }

    /// Run cycles until `max_cycles` is reached or `cancel` fires
    pub async fn run(&self, keys: Vec<String>, cancel: CancellationToken) -> RunSummary {
        let keys = Arc::new(keys);
        let mut summary = RunSummary::default();
        let idle = keys.is_empty() || self.config.workers == 0;

        loop {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if let Some(max) = self.config.max_cycles {
                if summary.cycles >= max {
                    break;
                }
            }

            let report = self.run_cycle(summary.cycles + 1, &keys, &cancel).await;
            summary.absorb(&report);

            if idle {
                info!("run_idle: no keys or no workers, nothing to repeat");
                break;
            }
        }

        info!(
            "run_done: cycles={} processed={} bytes={} skipped={} errors={} cancelled={}",
            summary.cycles,
            summary.processed,
            summary.bytes,
            summary.skipped,
            summary.errors,
            summary.cancelled
        );
        summary
    }

    /// One fan-out/fan-in pass over the key set
    pub async fn run_cycle(
        &self,
        cycle: u64,
        keys: &Arc<Vec<String>>,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let shards = partition(keys.len(), self.config.workers, self.config.partitioning);
        info!(
            "cycle_start: cycle={} mode={} workers={} keys={}",
            cycle,
            self.runner.mode(),
            shards.len(),
            keys.len()
        );

        let handles: Vec<_> = shards
            .into_iter()
            .enumerate()
            .map(|(worker, shard)| {
                tokio::spawn(run_worker(
                    worker,
                    self.runner.clone(),
                    keys.clone(),
                    shard,
                    self.config.progress_every,
                    cancel.clone(),
                ))
            })
            .collect();

        info!("cycle_waiting: cycle={} workers={}", cycle, handles.len());
        let results = join_all(handles).await;

        let mut report = CycleReport::default();
        for (worker, result) in results.into_iter().enumerate() {
            match result {
                Ok(worker_report) => report.absorb(worker_report),
                Err(e) => report.errors.push(WorkerError::Join {
                    worker,
                    message: e.to_string(),
                }),
            }
        }

        for error in &report.errors {
            error!("cycle_error: cycle={} {}", cycle, error);
        }
        info!(
            "cycle_done: cycle={} processed={} bytes={} skipped={} errors={}",
            cycle,
            report.processed,
            report.bytes,
            report.skipped,
            report.errors.len()
        );
        report
    }
}
