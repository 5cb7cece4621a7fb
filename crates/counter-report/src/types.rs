//! Collector payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the process counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub bytes_downloaded: u64,
    pub bytes_deleted: u64,
    pub objects_downloaded: u64,
    pub objects_deleted: u64,
    pub transfer_errors: u64,
    pub delete_skips: u64,
}

/// Environment/version facts, registered once per process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub application: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl Environment {
    pub fn current(application: &str, version: &str) -> Self {
        Self {
            application: application.to_string(),
            version: version.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPayload {
    Register {
        environment: Environment,
    },
    Counters {
        application: String,
        pid: u32,
        timestamp: DateTime<Utc>,
        counters: CounterSnapshot,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_is_tagged() {
        let payload = ReportPayload::Counters {
            application: "bulkget".to_string(),
            pid: 1,
            timestamp: Utc::now(),
            counters: CounterSnapshot {
                bytes_downloaded: 42,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "counters");
        assert_eq!(value["counters"]["bytes_downloaded"], 42);

        let register = ReportPayload::Register {
            environment: Environment::current("bulkget", "0.1.0"),
        };
        let value = serde_json::to_value(&register).unwrap();
        assert_eq!(value["kind"], "register");
        assert_eq!(value["environment"]["version"], "0.1.0");
    }
}
