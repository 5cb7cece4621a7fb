//! Key listing

use futures_util::TryStreamExt;
use log::{debug, info};

use crate::error::ListError;
use crate::store::ObjectStore;

/// Collect every object key under `prefix`, recursively, in listing order.
///
/// Prefix placeholders are skipped. A failing enumeration discards whatever
/// was collected so far.
pub async fn list_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, ListError> {
    let mut entries = store.list_objects(bucket, prefix, true);
    let mut keys = Vec::new();
    let mut skipped = 0usize;

    while let Some(entry) = entries.try_next().await.map_err(|source| ListError {
        bucket: bucket.to_string(),
        prefix: prefix.to_string(),
        source,
    })? {
        if entry.is_prefix || entry.key.ends_with('/') {
            skipped += 1;
            continue;
        }
        keys.push(entry.key);
    }

    if skipped > 0 {
        debug!("list_keys: skipped {} prefix entries", skipped);
    }
    info!("list_keys: {}/{} keys={}", bucket, prefix, keys.len());
    Ok(keys)
}
