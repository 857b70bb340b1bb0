//! Quote lookup over HTTP.
//!
//! `GET {url}?stock={stock}&username={username}`. The body is either a bare
//! decimal or a quote server reply line.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use trig_core::Price;

use crate::error::{QuoteError, QuoteResult};
use crate::provider::{BoxFuture, QuoteProvider};
use crate::tcp::parse_quote_reply;

/// HTTP quote client.
pub struct HttpQuoteClient {
    client: Client,
    url: String,
}

impl HttpQuoteClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> QuoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn fetch(&self, stock: &str, username: &str) -> QuoteResult<Price> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("stock", stock), ("username", username)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuoteError::HttpClient(format!("request timed out: {e}"))
                } else {
                    QuoteError::HttpClient(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuoteError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::HttpClient(format!("Failed to read body: {e}")))?;

        parse_quote_reply(&body, stock)
    }
}

impl QuoteProvider for HttpQuoteClient {
    fn quote<'a>(&'a self, stock: &'a str, username: &'a str) -> BoxFuture<'a, QuoteResult<Price>> {
        Box::pin(async move {
            let result = self.fetch(stock, username).await;
            debug!(url = %self.url, stock, ok = result.is_ok(), "HTTP quote lookup");
            result
        })
    }
}
