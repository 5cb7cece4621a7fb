//! Process-level wiring: session, bucket, listing, reporter, cycles

use counter_report::{Counters, Environment, Reporter, ReporterConfig};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::bucket::resolve_bucket;
use crate::config::{Config, MetricsConfig};
use crate::error::SetupError;
use crate::lister::list_keys;
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::store::{AccessGrant, ObjectStore, S3Store};
use crate::transfer::TransferRunner;

const APPLICATION: &str = env!("CARGO_PKG_NAME");
const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit status after a second interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

/// Open an S3 session from the access grant and run to completion.
///
/// Ctrl-C stops new keys from starting; in-flight transfers finish. A second
/// Ctrl-C exits immediately.
pub async fn execute(config: Config) -> Result<RunSummary, SetupError> {
    let grant = AccessGrant::parse(&config.access)?;
    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::connect(&grant)?);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    execute_with_store(store, config, cancel).await
}

/// Everything after session setup, against any store
pub async fn execute_with_store(
    store: Arc<dyn ObjectStore>,
    config: Config,
    cancel: CancellationToken,
) -> Result<RunSummary, SetupError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let bucket = resolve_bucket(store.as_ref(), &config.bucket, &mut rng).await?;
    let keys = list_keys(store.as_ref(), &bucket, &config.prefix).await?;

    let counters = Arc::new(Counters::new());
    let reporter = config
        .metrics
        .as_ref()
        .and_then(|metrics| start_reporter(metrics, counters.clone()));

    info!(
        "run_start: bucket={} prefix={} keys={} workers={} mode={} forever={}",
        bucket,
        config.prefix,
        keys.len(),
        config.run.workers,
        config.run.mode,
        config.run.max_cycles.is_none()
    );

    let runner = Arc::new(TransferRunner::new(
        store,
        bucket,
        config.run.mode,
        counters,
    ));
    let summary = Orchestrator::new(runner, config.run).run(keys, cancel).await;

    if let Some(reporter) = reporter {
        reporter.stop().await;
    }
    Ok(summary)
}

fn start_reporter(metrics: &MetricsConfig, counters: Arc<Counters>) -> Option<Reporter> {
    let config = ReporterConfig {
        endpoint: metrics.endpoint.clone(),
        interval: metrics.interval,
        timeout: REPORT_TIMEOUT,
    };
    let environment = Environment::current(APPLICATION, env!("CARGO_PKG_VERSION"));
    match Reporter::start(config, environment, counters) {
        Ok(reporter) => Some(reporter),
        Err(e) => {
            warn!("reporter_disabled: {}", e);
            None
        }
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match wait_for_interrupts(tokio::signal::ctrl_c, cancel).await {
            Ok(()) => std::process::exit(EXIT_INTERRUPTED),
            Err(e) => warn!("interrupt_handler: failed to listen for ctrl-c: {}", e),
        }
    });
}

/// Cancel on the first interrupt, return on the second
async fn wait_for_interrupts<F, Fut>(mut next: F, cancel: CancellationToken) -> io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    next().await?;
    warn!("interrupt: finishing in-flight transfers, no new keys will start (interrupt again to exit)");
    cancel.cancel();

    next().await?;
    warn!("interrupt_again: exiting without waiting for in-flight transfers");
    Ok(())
}
