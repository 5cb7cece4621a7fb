//! Single-key transfer: download-and-discard or delete

use counter_report::Counters;
use log::warn;
use std::sync::Arc;

use crate::config::Mode;
use crate::error::TransferError;
use crate::store::ObjectStore;

/// Result of one key that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes read, or the recorded size of a deleted object
    Transferred(u64),
    /// Best-effort delete that did not go through
    Skipped,
}

pub struct TransferRunner {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    mode: Mode,
    counters: Arc<Counters>,
}

impl TransferRunner {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        mode: Mode,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            mode,
            counters,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Process one key in the configured mode.
    ///
    /// Download failures are returned. Delete failures are logged and
    /// reported as [`Outcome::Skipped`].
    pub async fn run_key(&self, key: &str) -> Result<Outcome, TransferError> {
        match self.mode {
            Mode::Download => match self.download(key).await {
                Ok(bytes) => Ok(Outcome::Transferred(bytes)),
                Err(e) => {
                    self.counters.record_transfer_error();
                    Err(e)
                }
            },
            Mode::Delete => match self.delete(key).await {
                Ok(bytes) => Ok(Outcome::Transferred(bytes)),
                Err(e) => {
                    warn!("delete_skipped: {}/{} error={}", self.bucket, key, e);
                    self.counters.record_delete_skip();
                    Ok(Outcome::Skipped)
                }
            },
        }
    }

    /// Read the whole object into a sink and return its length.
    ///
    /// The stream is closed before returning on both success and read
    /// failure. A close failure only produces a warning.
    pub async fn download(&self, key: &str) -> Result<u64, TransferError> {
        let mut stream = self
            .store
            .open_object(&self.bucket, key)
            .await
            .map_err(|source| TransferError::Open {
                key: key.to_string(),
                source,
            })?;

        let copied = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await;

        if let Err(e) = stream.close().await {
            warn!("close_failed: {}/{} error={}", self.bucket, key, e);
        }

        let bytes = copied.map_err(|source| TransferError::Read {
            key: key.to_string(),
            source,
        })?;

        self.counters.record_download(bytes);
        Ok(bytes)
    }

    /// Delete the object, returning its recorded size (0 when unknown)
    pub async fn delete(&self, key: &str) -> Result<u64, TransferError> {
        let size = self
            .store
            .delete_object(&self.bucket, key)
            .await
            .map_err(|source| TransferError::Delete {
                key: key.to_string(),
                source,
            })?;

        let bytes = size.unwrap_or(0);
        self.counters.record_delete(bytes);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn runner(store: Arc<MemoryStore>, mode: Mode) -> (TransferRunner, Arc<Counters>) {
        let counters = Arc::new(Counters::new());
        (
            TransferRunner::new(store, "b", mode, counters.clone()),
            counters,
        )
    }

    #[tokio::test]
    async fn download_counts_bytes_and_closes() {
        let store = Arc::new(MemoryStore::new().with_object("b", "k", &[7u8; 4096]));
        let (runner, counters) = runner(store.clone(), Mode::Download);

        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Transferred(4096));
        assert_eq!(counters.bytes_downloaded(), 4096);
        assert_eq!(store.opens(), 1);
        assert_eq!(store.closes(), 1);
    }

    #[tokio::test]
    async fn read_failure_still_closes_stream() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("b", "k", b"data")
                .with_broken_read("k"),
        );
        let (runner, counters) = runner(store.clone(), Mode::Download);

        let err = runner.run_key("k").await.unwrap_err();
        assert!(matches!(err, TransferError::Read { .. }));
        assert_eq!(err.key(), "k");
        assert_eq!(store.closes(), 1);
        assert_eq!(counters.bytes_downloaded(), 0);
        assert_eq!(counters.snapshot().transfer_errors, 1);
    }

    #[tokio::test]
    async fn close_failure_after_full_read_is_only_a_warning() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("b", "k", &[3u8; 77])
                .with_broken_close("k"),
        );
        let (runner, counters) = runner(store.clone(), Mode::Download);

        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Transferred(77));
        assert_eq!(counters.bytes_downloaded(), 77);
        assert_eq!(counters.snapshot().transfer_errors, 0);
        assert_eq!(store.closes(), 1);
    }

    #[tokio::test]
    async fn open_failure_is_an_error() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("b", "k", b"data")
                .with_broken_open("k"),
        );
        let (runner, _) = runner(store.clone(), Mode::Download);

        let err = runner.run_key("k").await.unwrap_err();
        assert!(matches!(err, TransferError::Open { .. }));
        assert_eq!(store.opens(), 0);
    }

    #[tokio::test]
    async fn missing_object_download_fails() {
        let store = Arc::new(MemoryStore::new().with_bucket("b"));
        let (runner, _) = runner(store, Mode::Download);

        let err = runner.download("absent").await.unwrap_err();
        assert!(matches!(err, TransferError::Open { ref source, .. } if source.is_not_found()));
    }

    #[tokio::test]
    async fn delete_records_size_of_removed_object() {
        let store = Arc::new(MemoryStore::new().with_object("b", "k", b"12345"));
        let (runner, counters) = runner(store.clone(), Mode::Delete);

        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Transferred(5));
        assert_eq!(counters.bytes_deleted(), 5);
        assert!(!store.contains("b", "k"));
    }

    #[tokio::test]
    async fn second_delete_is_skipped_not_fatal() {
        let store = Arc::new(MemoryStore::new().with_object("b", "k", b"12345"));
        let (runner, counters) = runner(store, Mode::Delete);

        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Transferred(5));
        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Skipped);
        assert_eq!(counters.bytes_deleted(), 5);
        assert_eq!(counters.snapshot().delete_skips, 1);
    }

    #[tokio::test]
    async fn denied_delete_is_skipped() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("b", "k", b"x")
                .with_broken_delete("k"),
        );
        let (runner, _) = runner(store.clone(), Mode::Delete);

        assert_eq!(runner.run_key("k").await.unwrap(), Outcome::Skipped);
        assert!(store.contains("b", "k"));
    }
}
