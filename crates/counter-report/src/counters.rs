use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::CounterSnapshot;

/// Cumulative counters for the whole process. Only ever incremented.
#[derive(Debug, Default)]
pub struct Counters {
    bytes_downloaded: AtomicU64,
    bytes_deleted: AtomicU64,
    objects_downloaded: AtomicU64,
    objects_deleted: AtomicU64,
    transfer_errors: AtomicU64,
    delete_skips: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_download(&self, bytes: u64) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
        self.objects_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self, bytes: u64) {
        self.bytes_deleted.fetch_add(bytes, Ordering::Relaxed);
        self.objects_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transfer_error(&self) {
        self.transfer_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete_skip(&self) {
        self.delete_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Relaxed)
    }

    pub fn bytes_deleted(&self) -> u64 {
        self.bytes_deleted.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            bytes_deleted: self.bytes_deleted.load(Ordering::Relaxed),
            objects_downloaded: self.objects_downloaded.load(Ordering::Relaxed),
            objects_deleted: self.objects_deleted.load(Ordering::Relaxed),
            transfer_errors: self.transfer_errors.load(Ordering::Relaxed),
            delete_skips: self.delete_skips.load(Ordering::Relaxed),
        }
    }
}
