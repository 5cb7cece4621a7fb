//! Object store access
//!
//! This module is organized into submodules:
//! - `types`: Access grant parsing and S3 client creation
//! - `s3`: `ObjectStore` implementation backed by the AWS SDK
//! - `memory`: in-memory store used by tests

mod s3;
mod types;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::error::StoreError;

pub use s3::S3Store;
pub use types::{create_s3_client, AccessGrant, DEFAULT_REGION};

pub type StoreResult<T> = Result<T, StoreError>;

/// One item of an object listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub key: String,
    /// Virtual folder rather than a real object
    pub is_prefix: bool,
}

impl ListEntry {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: false,
        }
    }

    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: true,
        }
    }
}

/// Readable object body with an explicit close
#[async_trait]
pub trait ObjectStream: AsyncRead + Send + Unpin {
    /// Release the underlying connection. Reads after close fail.
    async fn close(&mut self) -> StoreResult<()>;
}

/// Operations the transfer client needs from the object store.
///
/// Implementations must be safe for concurrent use by many workers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> StoreResult<Vec<String>>;

    /// Use the bucket if it exists, create it otherwise
    async fn ensure_bucket(&self, name: &str) -> StoreResult<()>;

    /// Lazily enumerate the objects under `prefix`. Paging is internal.
    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
        recursive: bool,
    ) -> BoxStream<'a, StoreResult<ListEntry>>;

    async fn open_object(&self, bucket: &str, key: &str) -> StoreResult<Box<dyn ObjectStream>>;

    /// Delete one object, returning its size when the store reports it
    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<Option<u64>>;
}
