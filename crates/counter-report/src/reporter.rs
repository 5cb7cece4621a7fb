//! Background reporting loop
//!
//! The reporter posts a `register` payload once, then a `counters` payload
//! every interval and one last time on `stop`. Delivery failures are logged
//! and otherwise ignored.

use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::counters::Counters;
use crate::types::{Environment, ReportPayload};

/// Smallest accepted reporting period
const MIN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub endpoint: String,
    pub interval: Duration,
    pub timeout: Duration,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to build report client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Handle to the running report loop
pub struct Reporter {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Reporter {
    /// Spawn the report loop on the current tokio runtime
    pub fn start(
        config: ReporterConfig,
        environment: Environment,
        counters: Arc<Counters>,
    ) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ReportError::Client)?;

        info!(
            "reporter_start: endpoint={} interval_ms={}",
            config.endpoint,
            config.interval.as_millis()
        );

        let sink = ReportSink {
            client,
            endpoint: config.endpoint,
            application: environment.application.clone(),
            pid: environment.pid,
            counters,
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sink.run(
            environment,
            config.interval.max(MIN_INTERVAL),
            cancel.clone(),
        ));

        Ok(Self { cancel, handle })
    }

    /// Stop the loop after one final snapshot
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("reporter_stop: join error={}", e);
        }
        info!("reporter_stop: done");
    }
}

struct ReportSink {
    client: Client,
    endpoint: String,
    application: String,
    pid: u32,
    counters: Arc<Counters>,
}

impl ReportSink {
    async fn run(self, environment: Environment, interval: Duration, cancel: CancellationToken) {
        // A collector that never answers must not hold up stop()
        let register = ReportPayload::Register { environment };
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("report_register_abandoned: stop requested");
                self.send_snapshot().await;
                return;
            }
            _ = self.send(&register) => {}
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.send_snapshot().await,
            }
        }

        self.send_snapshot().await;
    }

    async fn send_snapshot(&self) {
        let payload = ReportPayload::Counters {
            application: self.application.clone(),
            pid: self.pid,
            timestamp: chrono::Utc::now(),
            counters: self.counters.snapshot(),
        };
        self.send(&payload).await;
    }

    async fn send(&self, payload: &ReportPayload) {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("report_encode_failed: error={}", e);
                return;
            }
        };

        let result = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("report_sent: status={}", response.status());
            }
            Ok(response) => {
                warn!(
                    "report_rejected: endpoint={} status={}",
                    self.endpoint,
                    response.status()
                );
            }
            Err(e) => {
                warn!("report_failed: endpoint={} error={}", self.endpoint, e);
            }
        }
    }
}
