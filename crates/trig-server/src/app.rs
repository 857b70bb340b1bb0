//! Main application orchestration.
//!
//! Coordinates:
//! - Trigger registry and engine (one poller task per active trigger)
//! - Completion dispatcher (single task, FIFO ledger notifications)
//! - HTTP server
//! - Shutdown on ctrl-c / SIGTERM

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use trig_engine::{
    CompletionDispatcher, DispatchStats, LedgerNotifier, TcpLedgerNotifier, TriggerEngine,
};
use trig_quote::{build_provider, QuoteProvider};
use trig_registry::TriggerRegistry;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Main application.
pub struct Application {
    config: AppConfig,
    engine: Arc<TriggerEngine>,
    dispatcher: CompletionDispatcher,
    shutdown: CancellationToken,
}

impl Application {
    /// Build the application with the configured quote provider and a TCP
    /// ledger notifier.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let quotes = build_provider(&config.quote)?;
        let notifier = Arc::new(TcpLedgerNotifier::new(
            config.ledger.addr.clone(),
            config.ledger.connect_timeout(),
        ));
        Ok(Self::with_components(config, quotes, notifier))
    }

    /// Build the application around explicit collaborators.
    pub fn with_components(
        config: AppConfig,
        quotes: Arc<dyn QuoteProvider>,
        notifier: Arc<dyn LedgerNotifier>,
    ) -> Self {
        let registry = Arc::new(TriggerRegistry::new());
        let (engine, completion_rx) = TriggerEngine::new(registry.clone(), quotes, &config.engine);
        let dispatcher =
            CompletionDispatcher::new(registry, notifier, completion_rx, &config.ledger);

        Self {
            config,
            engine: Arc::new(engine),
            dispatcher,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn engine(&self) -> &Arc<TriggerEngine> {
        &self.engine
    }

    /// Cancelling this token stops the application as a signal would.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the configured address and run until shutdown.
    pub async fn run(self) -> AppResult<DispatchStats> {
        let listener = trig_http::bind(&self.config.server).await?;
        self.run_with_listener(listener).await
    }

    /// Run on an already-bound listener until shutdown.
    ///
    /// Shutdown order: HTTP stops accepting, pollers stop, the dispatcher
    /// drains fires already queued and exits.
    pub async fn run_with_listener(self, listener: TcpListener) -> AppResult<DispatchStats> {
        let Self {
            config: _,
            engine,
            dispatcher,
            shutdown,
        } = self;

        let dispatch_handle = tokio::spawn(dispatcher.run());

        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signal_token.cancelled() => {}
                _ = shutdown_signal() => {
                    info!("Shutdown signal received");
                    signal_token.cancel();
                }
            }
        });

        let served = trig_http::serve(listener, engine.clone(), shutdown.clone()).await;
        if let Err(e) = &served {
            error!(error = %e, "HTTP server failed");
        }
        shutdown.cancel();

        engine.shutdown().await;
        let stats = dispatch_handle
            .await
            .map_err(|e| AppError::Task(format!("dispatcher: {e}")))?;

        served?;
        Ok(stats)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("listen", &self.config.server.listen_addr())
            .field("engine", &self.engine)
            .finish()
    }
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trig_engine::RecordingLedgerNotifier;
    use trig_quote::MockQuoteProvider;

    #[tokio::test]
    async fn test_shutdown_token_stops_run() {
        let app = Application::with_components(
            AppConfig::default(),
            Arc::new(MockQuoteProvider::new()),
            Arc::new(RecordingLedgerNotifier::new()),
        );
        let token = app.shutdown_token();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let handle = tokio::spawn(app.run_with_listener(listener));
        token.cancel();

        let stats = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats, DispatchStats::default());
    }

    #[test]
    fn test_new_builds_configured_provider() {
        let app = Application::new(AppConfig::default()).unwrap();
        assert!(app.engine().registry().is_empty());
    }
}
