//! Bucket selection

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SetupError;
use crate::store::ObjectStore;

/// Ensure `requested` exists, or pick a random existing bucket when empty.
pub async fn resolve_bucket<R: Rng + ?Sized>(
    store: &dyn ObjectStore,
    requested: &str,
    rng: &mut R,
) -> Result<String, SetupError> {
    let requested = requested.trim();
    if !requested.is_empty() {
        store
            .ensure_bucket(requested)
            .await
            .map_err(|source| SetupError::Bucket {
                bucket: requested.to_string(),
                source,
            })?;
        return Ok(requested.to_string());
    }

    let buckets = store
        .list_buckets()
        .await
        .map_err(|source| SetupError::Bucket {
            bucket: String::new(),
            source,
        })?;

    let picked = pick_bucket(&buckets, rng).ok_or(SetupError::NoBuckets)?;
    info!(
        "resolve_bucket: picked {} of {} buckets",
        picked,
        buckets.len()
    );
    Ok(picked.to_string())
}

pub fn pick_bucket<'a, R: Rng + ?Sized>(buckets: &'a [String], rng: &mut R) -> Option<&'a str> {
    buckets.choose(rng).map(String::as_str)
}
