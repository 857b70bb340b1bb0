//! Quote provider configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QuoteResult;
use crate::http::HttpQuoteClient;
use crate::provider::QuoteProvider;
use crate::tcp::QuoteServerClient;

/// Quote transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteKind {
    /// Legacy line-based TCP quote server.
    #[default]
    Tcp,
    /// HTTP GET endpoint.
    Http,
}

/// Quote provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    #[serde(default)]
    pub kind: QuoteKind,
    /// `host:port` of the TCP quote server.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Endpoint for `kind = "http"`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Per-lookup timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_addr() -> String {
    "127.0.0.1:4444".to_string()
}

fn default_url() -> String {
    "http://127.0.0.1:4445/quote".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            kind: QuoteKind::default(),
            addr: default_addr(),
            url: default_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl QuoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Build the configured provider.
pub fn build_provider(config: &QuoteConfig) -> QuoteResult<Arc<dyn QuoteProvider>> {
    Ok(match config.kind {
        QuoteKind::Tcp => Arc::new(QuoteServerClient::new(config.addr.clone(), config.timeout())),
        QuoteKind::Http => Arc::new(HttpQuoteClient::new(config.url.clone(), config.timeout())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QuoteConfig::default();
        assert_eq!(config.kind, QuoteKind::Tcp);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_build_both_kinds() {
        let mut config = QuoteConfig::default();
        assert!(build_provider(&config).is_ok());
        config.kind = QuoteKind::Http;
        assert!(build_provider(&config).is_ok());
    }
}
