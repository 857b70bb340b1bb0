//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl HttpConfig {
    /// `bind_addr:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let config = HttpConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8082");

        let config: HttpConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }
}
