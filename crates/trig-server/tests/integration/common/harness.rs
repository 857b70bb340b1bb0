//! Running application plus an HTTP client pointed at it.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use trig_engine::{DispatchStats, TcpLedgerNotifier};
use trig_quote::MockQuoteProvider;
use trig_server::{AppConfig, AppResult, Application};

pub struct TestServer {
    pub base_url: String,
    pub quotes: Arc<MockQuoteProvider>,
    client: reqwest::Client,
    shutdown: CancellationToken,
    handle: JoinHandle<AppResult<DispatchStats>>,
}

impl TestServer {
    /// Start the application with a 20ms poll interval, notifying `ledger_addr`.
    pub async fn start(ledger_addr: String) -> Self {
        let mut config = AppConfig::default();
        config.engine.poll_interval_ms = 20;
        config.ledger.addr = ledger_addr.clone();

        let quotes = Arc::new(MockQuoteProvider::new());
        let notifier = Arc::new(TcpLedgerNotifier::new(ledger_addr, Duration::from_secs(1)));
        let app = Application::with_components(config, quotes.clone(), notifier);
        let shutdown = app.shutdown_token();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(app.run_with_listener(listener));

        Self {
            base_url,
            quotes,
            client: reqwest::Client::new(),
            shutdown,
            handle,
        }
    }

    /// GET `path` and return `(status, body)`.
    pub async fn get(&self, path: &str) -> (u16, String) {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.text().await.unwrap())
    }

    /// POST a urlencoded form to `path` and return `(status, body)`.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> (u16, String) {
        let body = form
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.text().await.unwrap())
    }

    /// Stop the application and return the dispatcher totals.
    pub async fn stop(self) -> DispatchStats {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap()
    }
}
