//! Command-line flags

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::ffi::OsString;
use std::time::Duration;

use crate::config::{
    Config, MetricsConfig, Mode, Partitioning, RunConfig, DEFAULT_METRICS_ENDPOINT,
    DEFAULT_METRICS_INTERVAL, PROGRESS_EVERY, VERBOSE_PROGRESS_EVERY,
};

/// Download (and discard) or delete every object under a prefix, using a
/// fixed number of concurrent workers.
///
/// ## Examples
///
/// Download a folder with 8 workers:
///   bulkget -a "$GRANT" -b media -p photos/ -w 8
///
/// Delete everything under a prefix:
///   bulkget -a "$GRANT" -b media -p tmp/ -w 4 -delete
///
/// Load loop with metrics:
///   bulkget -a "$GRANT" -b media -w 16 -f -m
#[derive(Parser, Debug)]
#[command(name = "bulkget", version, about, long_about = None)]
pub struct Cli {
    /// Serialized access grant
    #[arg(
        short = 'a',
        long = "access",
        env = "PROJECT_ACCESS",
        default_value = "",
        hide_env_values = true
    )]
    pub access: String,

    /// Bucket name; empty picks a random existing bucket
    #[arg(short = 'b', long = "bucket", env = "BUCKET_NAME", default_value = "")]
    pub bucket: String,

    /// Key prefix (folder path); empty means the whole bucket
    #[arg(short = 'p', long = "path", env = "DOWLOAD_PATH", default_value = "")]
    pub path: String,

    /// Number of workers
    #[arg(short = 'w', long = "workers", default_value_t = 1)]
    pub workers: usize,

    /// Repeat over the same key list until interrupted
    #[arg(short = 'f', long = "forever")]
    pub forever: bool,

    /// Report counters to the metrics collector
    #[arg(short = 'm', long = "metrics")]
    pub metrics: bool,

    /// Delete objects instead of downloading them (also accepted as -delete,
    /// -delete=true and -delete=false)
    #[arg(
        long = "delete",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub delete: bool,

    /// How keys are split between workers
    #[arg(long, value_enum, default_value_t = Partitioning::Contiguous)]
    pub partitioning: Partitioning,

    /// Seed for the random bucket pick
    #[arg(long)]
    pub seed: Option<u64>,

    /// Collector URL for -m
    #[arg(long, env = "METRICS_ENDPOINT", default_value = DEFAULT_METRICS_ENDPOINT)]
    pub metrics_endpoint: String,

    /// Seconds between metric reports
    #[arg(long, default_value_t = DEFAULT_METRICS_INTERVAL.as_secs())]
    pub metrics_interval: u64,

    /// More logging; also logs progress every 10 keys instead of every 1000
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

/// Rewrite the single-dash `-delete` and `-delete=<bool>` spellings to
/// their `--delete` forms
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(s) if s == "-delete" || s.starts_with("-delete=") => {
                OsString::from(format!("-{}", s))
            }
            _ => arg,
        })
        .collect()
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn into_config(self) -> Config {
        let progress_every = if self.verbose > 0 {
            VERBOSE_PROGRESS_EVERY
        } else {
            PROGRESS_EVERY
        };
        let metrics = self.metrics.then(|| MetricsConfig {
            endpoint: self.metrics_endpoint,
            interval: Duration::from_secs(self.metrics_interval),
        });

        Config {
            access: self.access,
            bucket: self.bucket,
            prefix: self.path,
            seed: self.seed,
            metrics,
            run: RunConfig {
                mode: if self.delete {
                    Mode::Delete
                } else {
                    Mode::Download
                },
                workers: self.workers,
                partitioning: self.partitioning,
                progress_every,
                max_cycles: if self.forever { None } else { Some(1) },
            },
        }
    }
}
