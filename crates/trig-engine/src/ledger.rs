//! Ledger notification transport.
//!
//! The transaction server learns about fired triggers through one text line
//! per fire, sent over a short-lived TCP connection.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use trig_core::FiredTrigger;
use trig_quote::BoxFuture;

use crate::error::{LedgerError, LedgerResult};

/// Trait for delivering fire notifications to the ledger.
pub trait LedgerNotifier: Send + Sync {
    /// Deliver one notification.
    fn notify<'a>(&'a self, fired: &'a FiredTrigger) -> BoxFuture<'a, LedgerResult<()>>;
}

/// Dials the transaction server once per notification.
#[derive(Debug, Clone)]
pub struct TcpLedgerNotifier {
    addr: String,
    connect_timeout: Duration,
}

impl TcpLedgerNotifier {
    pub fn new(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
        }
    }

    async fn deliver(&self, line: String) -> LedgerResult<()> {
        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| LedgerError::Timeout {
                addr: self.addr.clone(),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|e| LedgerError::Connect {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?;

        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| LedgerError::Write(e.to_string()))?;
        stream
            .shutdown()
            .await
            .map_err(|e| LedgerError::Write(e.to_string()))?;

        debug!(addr = %self.addr, line = %line.trim_end(), "Ledger notified");
        Ok(())
    }
}

impl LedgerNotifier for TcpLedgerNotifier {
    fn notify<'a>(&'a self, fired: &'a FiredTrigger) -> BoxFuture<'a, LedgerResult<()>> {
        Box::pin(self.deliver(fired.notification_line()))
    }
}

/// In-memory notifier for testing.
///
/// Records every delivered trigger in order. `fail_next(n)` makes the next
/// `n` deliveries fail with a write error.
#[derive(Debug, Default)]
pub struct RecordingLedgerNotifier {
    delivered: Mutex<Vec<FiredTrigger>>,
    failures_left: Mutex<u32>,
    attempts: Mutex<u32>,
}

impl RecordingLedgerNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: u32) {
        *self.failures_left.lock() = n;
    }

    /// Delivered triggers, in delivery order.
    pub fn delivered(&self) -> Vec<FiredTrigger> {
        self.delivered.lock().clone()
    }

    /// Delivered notification lines, in delivery order.
    pub fn lines(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(FiredTrigger::notification_line)
            .collect()
    }

    /// Attempts including failed ones.
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }

    /// Wait until at least `count` deliveries were recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.delivered.lock().len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl LedgerNotifier for RecordingLedgerNotifier {
    fn notify<'a>(&'a self, fired: &'a FiredTrigger) -> BoxFuture<'a, LedgerResult<()>> {
        *self.attempts.lock() += 1;

        let result = {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                Err(LedgerError::Write("injected failure".to_string()))
            } else {
                self.delivered.lock().push(fired.clone());
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use trig_core::{Action, Price, Trigger, TriggerId, TriggerKey};

    fn fired() -> FiredTrigger {
        let mut t = Trigger::new_pending(
            TriggerId(4),
            TriggerKey::new(Action::Sell, "ABC", "carol"),
            99,
            25,
        );
        t.activate(Price::new(dec!(101.25)));
        FiredTrigger::new(t, Price::new(dec!(101.30)))
    }

    #[tokio::test]
    async fn test_tcp_notifier_sends_one_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            stream.read_to_string(&mut buf).await.unwrap();
            buf
        });

        let notifier = TcpLedgerNotifier::new(addr, Duration::from_secs(2));
        notifier.notify(&fired()).await.unwrap();

        assert_eq!(
            server.await.unwrap(),
            "TRIGGER_SUCCESS,99,SELL,carol,ABC,25,101.25\n"
        );
    }

    #[tokio::test]
    async fn test_tcp_notifier_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let notifier = TcpLedgerNotifier::new(addr, Duration::from_secs(2));
        let err = notifier.notify(&fired()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_recording_notifier_injected_failures() {
        let notifier = RecordingLedgerNotifier::new();
        notifier.fail_next(1);

        tokio_test::assert_err!(notifier.notify(&fired()).await);
        tokio_test::assert_ok!(notifier.notify(&fired()).await);
        assert_eq!(notifier.attempts(), 2);
        assert_eq!(notifier.delivered().len(), 1);
        assert!(notifier.wait_for(1, Duration::from_millis(10)).await);
    }
}
