//! Process-wide transfer counters and an optional background reporter
//!
//! - `counters`: lock-free byte/object counters shared by all workers
//! - `types`: payloads sent to the collector
//! - `reporter`: registration + periodic snapshot loop with explicit start/stop

mod counters;
mod reporter;
mod types;

pub use counters::Counters;
pub use reporter::{ReportError, Reporter, ReporterConfig};
pub use types::{CounterSnapshot, Environment, ReportPayload};
