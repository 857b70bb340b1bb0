//! Client for the legacy line-based TCP quote server.
//!
//! Protocol, one connection per quote:
//!
//! ```text
//! -> "{stock},{username}\n"
//! <- "{price},{stock},{username},{timestamp},{cryptokey}\n"
//! ```

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use trig_core::Price;

use crate::error::{QuoteError, QuoteResult};
use crate::provider::{BoxFuture, QuoteProvider};

/// Parse one quote server reply line.
///
/// The first field is the price. When a stock field is present it must
/// echo the requested symbol.
pub fn parse_quote_reply(line: &str, stock: &str) -> QuoteResult<Price> {
    let line = line.trim();
    if line.is_empty() {
        return Err(QuoteError::Malformed("empty reply".to_string()));
    }

    let mut fields = line.split(',').map(str::trim);
    let price_field = fields.next().unwrap_or_default();
    let price: Price = price_field
        .parse()
        .map_err(|e| QuoteError::Malformed(format!("bad price {price_field:?}: {e}")))?;

    if let Some(echoed) = fields.next() {
        if echoed != stock {
            return Err(QuoteError::Malformed(format!(
                "reply for {echoed:?}, requested {stock:?}"
            )));
        }
    }

    Ok(price)
}

/// Legacy quote server client.
#[derive(Debug, Clone)]
pub struct QuoteServerClient {
    addr: String,
    timeout: Duration,
}

impl QuoteServerClient {
    /// `timeout` bounds the whole exchange: connect, write, and read.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    async fn exchange(&self, stock: &str, username: &str) -> QuoteResult<Price> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream
            .write_all(format!("{stock},{username}\n").as_bytes())
            .await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(QuoteError::Io("connection closed before reply".to_string()));
        }
        trace!(reply = %line.trim_end(), "Quote server reply");

        parse_quote_reply(&line, stock)
    }
}

impl QuoteProvider for QuoteServerClient {
    fn quote<'a>(&'a self, stock: &'a str, username: &'a str) -> BoxFuture<'a, QuoteResult<Price>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = tokio::time::timeout(self.timeout, self.exchange(stock, username))
                .await
                .map_err(|_| QuoteError::Timeout(self.timeout.as_millis() as u64))?;
            debug!(
                stock,
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Quote lookup"
            );
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_full_reply() {
        let p = parse_quote_reply("49.99,ABC,alice,1168551000,KEY123=\n", "ABC").unwrap();
        assert_eq!(p, Price::new(dec!(49.99)));
    }

    #[test]
    fn test_parse_bare_price() {
        assert_eq!(parse_quote_reply("12.5", "ABC").unwrap(), Price::new(dec!(12.5)));
    }

    #[test]
    fn test_parse_rejects_wrong_stock() {
        let err = parse_quote_reply("10.00,XYZ,alice,1,k", "ABC").unwrap_err();
        assert!(matches!(err, QuoteError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_quote_reply("", "ABC").is_err());
        assert!(parse_quote_reply("not-a-price,ABC", "ABC").is_err());
    }

    /// One-shot fake quote server replying with `reply` to the first request.
    async fn fake_server(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            reader.read_line(&mut request).await.unwrap();
            reader.get_mut().write_all(reply.as_bytes()).await.unwrap();
            request
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let (addr, server) = fake_server("50.01,ABC,alice,1168551000,abc\n").await;
        let client = QuoteServerClient::new(addr, Duration::from_secs(2));

        let price = client.quote("ABC", "alice").await.unwrap();
        assert_eq!(price, Price::new(dec!(50.01)));
        assert_eq!(server.await.unwrap(), "ABC,alice\n");
    }

    #[tokio::test]
    async fn test_client_connection_refused_is_io_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = QuoteServerClient::new(addr, Duration::from_secs(2));
        let err = client.quote("ABC", "alice").await.unwrap_err();
        assert!(matches!(err, QuoteError::Io(_)));
    }

    #[tokio::test]
    async fn test_client_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = QuoteServerClient::new(addr, Duration::from_millis(100));
        let err = client.quote("ABC", "alice").await.unwrap_err();
        assert_eq!(err, QuoteError::Timeout(100));
    }
}
