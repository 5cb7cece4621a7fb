//! `ObjectStore` backed by the AWS SDK, for any S3-compatible endpoint

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use log::{debug, info};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use super::types::{create_s3_client, AccessGrant, DEFAULT_REGION};
use super::{ListEntry, ObjectStore, ObjectStream, StoreResult};
use crate::error::{SetupError, StoreError};

const LIST_PAGE_SIZE: i32 = 1000;

fn service_error<E, R>(op: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    StoreError::Service {
        op,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn not_found(bucket: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

enum ListCursor {
    Start,
    Next(String),
    Done,
}

pub struct S3Store {
    client: Client,
    region: String,
}

impl S3Store {
    /// Open a session for the grant. No request is sent until first use.
    pub fn connect(grant: &AccessGrant) -> Result<Self, SetupError> {
        if let Some(endpoint) = grant.endpoint.as_deref().map(str::trim) {
            if !endpoint.is_empty()
                && !endpoint.starts_with("http://")
                && !endpoint.starts_with("https://")
            {
                return Err(SetupError::Session(format!(
                    "endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        info!(
            "session_open: region={} endpoint={}",
            grant.region,
            grant.endpoint.as_deref().unwrap_or("default")
        );

        Ok(Self {
            client: create_s3_client(grant),
            region: grant.region.clone(),
        })
    }

    async fn next_page(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
        cursor: ListCursor,
    ) -> StoreResult<Option<(Vec<ListEntry>, ListCursor)>> {
        let token = match cursor {
            ListCursor::Done => return Ok(None),
            ListCursor::Start => None,
            ListCursor::Next(token) => Some(token),
        };

        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(LIST_PAGE_SIZE);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if !recursive {
            request = request.delimiter("/");
        }
        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| service_error("list_objects_v2", e))?;

        let mut entries: Vec<ListEntry> = response
            .common_prefixes()
            .iter()
            .filter_map(|prefix| prefix.prefix())
            .map(ListEntry::prefix)
            .collect();

        entries.extend(response.contents().iter().filter_map(|obj| {
            let key = obj.key()?;
            if key.ends_with('/') {
                return Some(ListEntry::prefix(key));
            }
            Some(ListEntry::object(key))
        }));

        let next = match (
            response.is_truncated().unwrap_or(false),
            response.next_continuation_token(),
        ) {
            (true, Some(token)) => ListCursor::Next(token.to_string()),
            _ => ListCursor::Done,
        };

        debug!(
            "list_page: {}/{} entries={} more={}",
            bucket,
            prefix,
            entries.len(),
            matches!(next, ListCursor::Next(_))
        );

        Ok(Some((entries, next)))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_buckets(&self) -> StoreResult<Vec<String>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| service_error("list_buckets", e))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn ensure_bucket(&self, name: &str) -> StoreResult<()> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => {
                debug!("ensure_bucket: {} exists", name);
                return Ok(());
            }
            Err(e) if e.as_service_error().map(|se| se.is_not_found()) == Some(true) => {}
            Err(e) => return Err(service_error("head_bucket", e)),
        }

        let mut request = self.client.create_bucket().bucket(name);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| service_error("create_bucket", e))?;

        info!("ensure_bucket: created {}", name);
        Ok(())
    }

    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
        recursive: bool,
    ) -> BoxStream<'a, StoreResult<ListEntry>> {
        stream::try_unfold(ListCursor::Start, move |cursor| {
            self.next_page(bucket, prefix, recursive, cursor)
        })
        .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, StoreError>)))
        .try_flatten()
        .boxed()
    }

    async fn open_object(&self, bucket: &str, key: &str) -> StoreResult<Box<dyn ObjectStream>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    not_found(bucket, key)
                } else {
                    service_error("get_object", e)
                }
            })?;

        Ok(Box::new(S3ObjectStream {
            body: Some(Box::pin(output.body.into_async_read())),
        }))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<Option<u64>> {
        // S3 deletes of missing keys succeed, so look the object up first
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_not_found()) == Some(true) {
                    not_found(bucket, key)
                } else {
                    service_error("head_object", e)
                }
            })?;
        let size = head.content_length().and_then(|len| u64::try_from(len).ok());

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| service_error("delete_object", e))?;

        Ok(size)
    }
}

struct S3ObjectStream {
    body: Option<Pin<Box<dyn AsyncRead + Send>>>,
}

impl AsyncRead for S3ObjectStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.body.as_mut() {
            Some(body) => body.as_mut().poll_read(cx, buf),
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "object stream already closed",
            ))),
        }
    }
}

#[async_trait]
impl ObjectStream for S3ObjectStream {
    async fn close(&mut self) -> StoreResult<()> {
        self.body = None;
        Ok(())
    }
}
