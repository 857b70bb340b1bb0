//! Mock transaction ledger for integration tests.
//!
//! Accepts one notification line per connection and records it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

pub struct MockLedger {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl MockLedger {
    /// Start a new mock ledger on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let lines_clone = lines.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((mut stream, _)) = listener.accept() => {
                        // Read inline so lines are recorded in connection order.
                        let mut buf = String::new();
                        if stream.read_to_string(&mut buf).await.is_ok() {
                            lines_clone.lock().await.push(buf);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            lines,
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub async fn lines(&self) -> Vec<String> {
        self.lines.lock().await.clone()
    }

    /// Wait until at least `count` lines were received.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.lines.lock().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
