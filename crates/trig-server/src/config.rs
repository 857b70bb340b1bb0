//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use trig_engine::{EngineConfig, LedgerConfig};
use trig_http::HttpConfig;
use trig_quote::QuoteConfig;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: HttpConfig,
    /// Poller and completion channel.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Quote provider.
    #[serde(default)]
    pub quote: QuoteConfig,
    /// Transaction ledger notifications.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Load `path` (defaults if it does not exist), apply environment
    /// overrides, and validate.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply the deployment environment variables shared with the other
    /// services of the simulation.
    ///
    /// - `triggeraddr` / `triggerport`: HTTP listener
    /// - `transaddr` / `transport`: transaction ledger
    /// - `quoteaddr` / `quoteport`: TCP quote server
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("triggeraddr") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = var("triggerport") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("triggerport is not a port: {port:?}")))?;
        }

        let ledger_host = var("transaddr");
        let ledger_port = var("transport");
        if ledger_host.is_some() || ledger_port.is_some() {
            self.ledger.addr = merge_host_port(&self.ledger.addr, ledger_host, ledger_port);
        }

        let quote_host = var("quoteaddr");
        let quote_port = var("quoteport");
        if quote_host.is_some() || quote_port.is_some() {
            self.quote.addr = merge_host_port(&self.quote.addr, quote_host, quote_port);
        }

        info!(
            listen = %self.server.listen_addr(),
            ledger = %self.ledger.addr,
            quote = %self.quote.addr,
            "Environment overrides applied"
        );
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::Config("server.port must be non-zero".to_string()));
        }
        if self.engine.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "engine.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.engine.completion_capacity == 0 {
            return Err(AppError::Config(
                "engine.completion_capacity must be non-zero".to_string(),
            ));
        }
        if self.ledger.max_attempts == 0 {
            return Err(AppError::Config(
                "ledger.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Replace the host and/or port of a `host:port` string.
fn merge_host_port(current: &str, host: Option<String>, port: Option<String>) -> String {
    let (cur_host, cur_port) = current.rsplit_once(':').unwrap_or((current, ""));
    let host = host.unwrap_or_else(|| cur_host.to_string());
    let port = port.unwrap_or_else(|| cur_port.to_string());
    format!("{}:{}", host.trim(), port.trim())
}
