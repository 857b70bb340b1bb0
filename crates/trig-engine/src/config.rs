//! Engine and ledger configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Poller and completion channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sampling interval of each condition poller (ms). Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Capacity of the fired-trigger channel. Default: 1024.
    #[serde(default = "default_completion_capacity")]
    pub completion_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_completion_capacity() -> usize {
    1_024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            completion_capacity: default_completion_capacity(),
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Transaction ledger notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// `host:port` of the transaction server.
    #[serde(default = "default_ledger_addr")]
    pub addr: String,
    /// Connect timeout (ms). Default: 15,000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Delivery attempts per fired trigger. Default: 1 (no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts (ms). Default: 200.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_ledger_addr() -> String {
    "127.0.0.1:44421".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    15_000
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    200
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            addr: default_ledger_addr(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl LedgerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
