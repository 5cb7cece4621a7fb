//! Worker loop over one shard

use log::{debug, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::partition::Shard;
use super::runner::{Outcome, TransferRunner};
use crate::error::TransferError;

#[derive(Debug, Default)]
pub struct WorkerReport {
    pub worker: usize,
    pub processed: usize,
    /// Bytes downloaded or deleted by this worker in this cycle
    pub bytes: u64,
    pub skipped: usize,
    pub errors: Vec<TransferError>,
    /// Stopped before the end of its shard
    pub cancelled: bool,
}

/// Process the shard's keys in order.
///
/// Cancellation is checked before each key; a transfer already in flight
/// runs to completion.
pub async fn run_worker(
    worker: usize,
    runner: Arc<TransferRunner>,
    keys: Arc<Vec<String>>,
    shard: Shard,
    progress_every: usize,
    cancel: CancellationToken,
) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        ..Default::default()
    };
    info!(
        "worker_start: worker={} mode={} keys={}",
        worker,
        runner.mode(),
        shard.len(keys.len())
    );

    for index in shard.indices(keys.len()) {
        if cancel.is_cancelled() {
            info!(
                "worker_cancelled: worker={} processed={}",
                worker, report.processed
            );
            report.cancelled = true;
            break;
        }

        let key = &keys[index];
        debug!("worker_key: worker={} {}/{}", worker, runner.bucket(), key);

        match runner.run_key(key).await {
            Ok(Outcome::Transferred(bytes)) => report.bytes += bytes,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => {
                warn!("transfer_failed: worker={} error={}", worker, e);
                report.errors.push(e);
            }
        }
        report.processed += 1;

        if progress_due(report.processed, progress_every) {
            info!(
                "worker_progress: worker={} processed={} bytes={}",
                worker, report.processed, report.bytes
            );
        }
    }

    info!(
        "worker_done: worker={} processed={} bytes={} skipped={} errors={}",
        worker,
        report.processed,
        report.bytes,
        report.skipped,
        report.errors.len()
    );
    report
}

/// A progress line is due after every `every` keys; 0 disables it
fn progress_due(processed: usize, every: usize) -> bool {
    every > 0 && processed > 0 && processed % every == 0
}
