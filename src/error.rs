//! Error types
//!
//! Setup errors abort the process. Transfer errors are captured per key and
//! aggregated per cycle; they never stop sibling workers.

use thiserror::Error;

/// Error returned by an [`ObjectStore`](crate::store::ObjectStore) call
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("{op} failed: {message}")]
    Service { op: &'static str, message: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Object enumeration failed; any partial listing was discarded
#[derive(Error, Debug)]
#[error("listing {bucket}/{prefix} failed: {source}")]
pub struct ListError {
    pub bucket: String,
    pub prefix: String,
    #[source]
    pub source: StoreError,
}

/// Failures before any worker starts
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("no access grant given (use -a or PROJECT_ACCESS)")]
    MissingAccess,

    #[error("invalid access grant: {0}")]
    InvalidAccess(String),

    #[error("failed to open session: {0}")]
    Session(String),

    #[error("failed to ensure bucket {bucket}: {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("no bucket given and the project has no buckets")]
    NoBuckets,

    #[error(transparent)]
    List(#[from] ListError),
}

/// Failure of a single key
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("failed to open {key}: {source}")]
    Open {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl TransferError {
    pub fn key(&self) -> &str {
        match self {
            TransferError::Open { key, .. }
            | TransferError::Read { key, .. }
            | TransferError::Delete { key, .. } => key,
        }
    }
}

/// Error captured from one worker of a cycle
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("worker {worker}: {error}")]
    Transfer { worker: usize, error: TransferError },

    #[error("worker {worker} did not finish: {message}")]
    Join { worker: usize, message: String },
}
