//! In-memory `ObjectStore` for tests

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use super::{ListEntry, ObjectStore, ObjectStream, StoreResult};
use crate::error::StoreError;

type OpenHook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct Bucket {
    /// Listing order; `None` marks a prefix placeholder
    entries: Vec<(String, Option<Vec<u8>>)>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
    broken_reads: HashSet<String>,
    broken_opens: HashSet<String>,
    broken_deletes: HashSet<String>,
    broken_closes: HashSet<String>,
    /// Fail the listing after this many entries
    list_fails_after: Option<usize>,
    failing_bucket_checks: bool,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    open_hook: Option<OpenHook>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, name: &str) -> Self {
        self.buckets
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        self
    }

    pub fn with_object(self, bucket: &str, key: &str, data: &[u8]) -> Self {
        self.push(bucket, key, Some(data.to_vec()));
        self
    }

    pub fn with_prefix(self, bucket: &str, key: &str) -> Self {
        self.push(bucket, key, None);
        self
    }

    pub fn with_broken_read(mut self, key: &str) -> Self {
        self.broken_reads.insert(key.to_string());
        self
    }

    pub fn with_broken_open(mut self, key: &str) -> Self {
        self.broken_opens.insert(key.to_string());
        self
    }

    pub fn with_broken_delete(mut self, key: &str) -> Self {
        self.broken_deletes.insert(key.to_string());
        self
    }

    pub fn with_broken_close(mut self, key: &str) -> Self {
        self.broken_closes.insert(key.to_string());
        self
    }

    pub fn with_list_failure_after(mut self, entries: usize) -> Self {
        self.list_fails_after = Some(entries);
        self
    }

    pub fn with_failing_bucket_checks(mut self) -> Self {
        self.failing_bucket_checks = true;
        self
    }

    /// Called with the running open count after each successful open
    pub fn on_open(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.open_hook = Some(Box::new(hook));
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.lock().unwrap().keys().cloned().collect()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|b| b.entries.iter().any(|(k, data)| k == key && data.is_some()))
            .unwrap_or(false)
    }

    fn push(&self, bucket: &str, key: &str, data: Option<Vec<u8>>) {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .entries
            .push((key.to_string(), data));
    }

    fn object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|b| {
                b.entries
                    .iter()
                    .find(|(k, data)| k == key && data.is_some())
                    .and_then(|(_, data)| data.clone())
            })
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> StoreResult<Vec<String>> {
        Ok(self.bucket_names())
    }

    async fn ensure_bucket(&self, name: &str) -> StoreResult<()> {
        if self.failing_bucket_checks {
            return Err(StoreError::Service {
                op: "head_bucket",
                message: "access denied".to_string(),
            });
        }
        self.buckets
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
        _recursive: bool,
    ) -> BoxStream<'a, StoreResult<ListEntry>> {
        let mut items: Vec<StoreResult<ListEntry>> = self
            .buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|b| {
                b.entries
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .map(|(key, data)| {
                        Ok(ListEntry {
                            key: key.clone(),
                            is_prefix: data.is_none(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(limit) = self.list_fails_after {
            items.truncate(limit);
            items.push(Err(StoreError::Service {
                op: "list_objects_v2",
                message: "connection reset".to_string(),
            }));
        }

        stream::iter(items).boxed()
    }

    async fn open_object(&self, bucket: &str, key: &str) -> StoreResult<Box<dyn ObjectStream>> {
        if self.broken_opens.contains(key) {
            return Err(StoreError::Service {
                op: "get_object",
                message: "internal error".to_string(),
            });
        }
        let data = self.object(bucket, key)?;
        let opened = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.open_hook {
            hook(opened);
        }

        Ok(Box::new(MemoryStream {
            data: io::Cursor::new(data),
            broken: self.broken_reads.contains(key),
            broken_close: self.broken_closes.contains(key),
            closed: false,
            closes: self.closes.clone(),
        }))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<Option<u64>> {
        if self.broken_deletes.contains(key) {
            return Err(StoreError::Service {
                op: "delete_object",
                message: "access denied".to_string(),
            });
        }
        let mut buckets = self.buckets.lock().unwrap();
        let entries = &mut buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?
            .entries;
        let position = entries
            .iter()
            .position(|(k, data)| k == key && data.is_some())
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        let (_, data) = entries.remove(position);
        Ok(data.map(|d| d.len() as u64))
    }
}

struct MemoryStream {
    data: io::Cursor<Vec<u8>>,
    broken: bool,
    broken_close: bool,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

impl AsyncRead for MemoryStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.broken {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Pin::new(&mut self.data).poll_read(cx, buf)
    }
}

#[async_trait]
impl ObjectStream for MemoryStream {
    async fn close(&mut self) -> StoreResult<()> {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        if self.broken_close {
            return Err(StoreError::Service {
                op: "close",
                message: "stream reset".to_string(),
            });
        }
        Ok(())
    }
}
