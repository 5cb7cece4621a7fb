//! Transfer module - per-key work and the worker loop
//!
//! - `partition`: splitting the key set into disjoint shards
//! - `runner`: download-and-discard / delete of a single key
//! - `worker`: iterates one shard, counts bytes, logs progress

mod partition;
mod runner;
mod worker;

pub use partition::{partition, Shard};
pub use runner::{Outcome, TransferRunner};
pub use worker::{run_worker, WorkerReport};
