//! Run configuration shared by the CLI and the orchestrator

use clap::ValueEnum;
use std::fmt;
use std::time::Duration;

/// Progress cadence at normal verbosity
pub const PROGRESS_EVERY: usize = 1000;

/// Progress cadence with `-v`
pub const VERBOSE_PROGRESS_EVERY: usize = 10;

pub const DEFAULT_METRICS_ENDPOINT: &str = "http://127.0.0.1:9000/metrics";

pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Download,
    Delete,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Download => write!(f, "download"),
            Mode::Delete => write!(f, "delete"),
        }
    }
}

/// How the key set is split between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Partitioning {
    /// One contiguous run of keys per worker
    #[default]
    Contiguous,
    /// Worker i takes every W-th key starting at i
    Striped,
}

/// Everything the orchestrator needs for a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub workers: usize,
    pub partitioning: Partitioning,
    pub progress_every: usize,
    /// `None` repeats until cancelled
    pub max_cycles: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Download,
            workers: 1,
            partitioning: Partitioning::Contiguous,
            progress_every: PROGRESS_EVERY,
            max_cycles: Some(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub endpoint: String,
    pub interval: Duration,
}

/// Full process configuration produced by the CLI
#[derive(Debug, Clone)]
pub struct Config {
    pub access: String,
    /// Empty picks a random existing bucket
    pub bucket: String,
    pub prefix: String,
    pub seed: Option<u64>,
    pub metrics: Option<MetricsConfig>,
    pub run: RunConfig,
}
