//! Client configuration loaded from environment variables.

use std::time::Duration;

use reciva_batch::{PollConfig, SingleConfig};

/// Configuration for the extraction service client.
///
/// All fields have defaults suitable for a local service instance.
/// Override via environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (default: `http://localhost:8000`).
    pub api_base: String,
    /// Delay between batch poll cycles in milliseconds (default: `2000`).
    pub poll_interval_ms: u64,
    /// Optional ceiling on batch poll cycles (default: unbounded).
    pub max_cycles: Option<u32>,
    /// Attempt ceiling for single-document polling (default: `60`).
    pub max_attempts: u32,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `RECEIPTS_API_BASE`         | `http://localhost:8000` |
    /// | `RECEIPTS_POLL_INTERVAL_MS` | `2000`                  |
    /// | `RECEIPTS_MAX_CYCLES`       | unset (unbounded)       |
    /// | `RECEIPTS_MAX_ATTEMPTS`     | `60`                    |
    pub fn from_env() -> Self {
        let api_base =
            std::env::var("RECEIPTS_API_BASE").unwrap_or_else(|_| "http://localhost:8000".into());

        let poll_interval_ms: u64 = std::env::var("RECEIPTS_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("RECEIPTS_POLL_INTERVAL_MS must be a valid u64");

        let max_cycles: Option<u32> = std::env::var("RECEIPTS_MAX_CYCLES")
            .ok()
            .map(|v| v.parse().expect("RECEIPTS_MAX_CYCLES must be a valid u32"));

        let max_attempts: u32 = std::env::var("RECEIPTS_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RECEIPTS_MAX_ATTEMPTS must be a valid u32");

        Self {
            api_base,
            poll_interval_ms,
            max_cycles,
            max_attempts,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_cycles: self.max_cycles,
        }
    }

    pub fn single_config(&self) -> SingleConfig {
        SingleConfig {
            max_attempts: self.max_attempts,
            ..Default::default()
        }
    }
}
