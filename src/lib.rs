//! bulkget - bounded-concurrency batch download/delete for S3-compatible stores
//!
//! - `store`: the `ObjectStore` seam and its S3 implementation
//! - `bucket`, `lister`: setup phase (bucket resolution, key listing)
//! - `transfer`: partitioning, per-key runner, worker loop
//! - `orchestrator`: cycles, fan-out/fan-in, error aggregation
//! - `run`: process wiring used by the binary

pub mod bucket;
pub mod cli;
pub mod config;
pub mod error;
pub mod lister;
pub mod orchestrator;
pub mod run;
pub mod store;
pub mod transfer;

pub use config::{Config, Mode, Partitioning, RunConfig};
pub use error::{ListError, SetupError, StoreError, TransferError, WorkerError};
pub use orchestrator::{CycleReport, Orchestrator, RunSummary};
