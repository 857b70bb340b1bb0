//! HTTP server implementation using axum.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use trig_core::Trigger;
use trig_engine::TriggerEngine;
use trig_registry::Book;
use trig_telemetry::render_metrics;

use crate::config::HttpConfig;
use crate::error::{HttpError, HttpResult};
use crate::params::{CancelParams, ListParams, SetParams, StartParams};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<TriggerEngine>,
}

impl AppState {
    pub fn new(engine: Arc<TriggerEngine>) -> Self {
        Self { engine }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/setTrigger", get(set_trigger).post(set_trigger))
        .route("/startTrigger", get(start_trigger).post(start_trigger))
        .route("/cancelTrigger", get(cancel_trigger).post(cancel_trigger))
        .route("/runningTriggers", get(running_triggers))
        .route("/waitingTriggers", get(waiting_triggers))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Register a PENDING trigger.
async fn set_trigger(
    State(state): State<AppState>,
    Form(params): Form<SetParams>,
) -> HttpResult<String> {
    let req = params.validate()?;
    let registration = state
        .engine
        .register(req.key, req.transaction_number, req.share_amount);
    Ok(registration.trigger.to_string())
}

/// Arm a pending trigger with its threshold and start polling.
async fn start_trigger(
    State(state): State<AppState>,
    Form(params): Form<StartParams>,
) -> HttpResult<String> {
    let (key, price) = params.validate()?;
    let trigger = state.engine.activate(&key, price)?;
    Ok(trigger.to_string())
}

async fn cancel_trigger(
    State(state): State<AppState>,
    Form(params): Form<CancelParams>,
) -> HttpResult<String> {
    let key = params.validate()?;
    let trigger = state.engine.cancel(&key)?;
    Ok(trigger.to_string())
}

async fn running_triggers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    listing(state.engine.snapshot(Book::Active), &params)
}

async fn waiting_triggers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    listing(state.engine.snapshot(Book::Pending), &params)
}

fn listing(triggers: Vec<Trigger>, params: &ListParams) -> Response {
    if params.wants_json() {
        return Json(triggers).into_response();
    }
    triggers
        .iter()
        .map(|t| format!("{t}\n"))
        .collect::<String>()
        .into_response()
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> HttpResult<Response> {
    let body = render_metrics().map_err(|e| HttpError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Bind the listening socket. Failure here is fatal at startup.
pub async fn bind(config: &HttpConfig) -> HttpResult<TcpListener> {
    let addr = config.listen_addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| HttpError::Bind { addr, source })
}

/// Serve on an already-bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    engine: Arc<TriggerEngine>,
    shutdown: CancellationToken,
) -> HttpResult<()> {
    let local = listener.local_addr().map_err(HttpError::Serve)?;
    info!(addr = %local, "Trigger server listening");

    let app = create_router(AppState::new(engine));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(HttpError::Serve)?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;
    use trig_core::Price;
    use trig_engine::EngineConfig;
    use trig_quote::MockQuoteProvider;
    use trig_registry::TriggerRegistry;

    fn app() -> (Router, Arc<TriggerEngine>) {
        let quotes = Arc::new(MockQuoteProvider::new());
        quotes.set_price("ABC", Price::new(dec!(100)));
        let (engine, _rx) = TriggerEngine::new(
            Arc::new(TriggerRegistry::new()),
            quotes,
            &EngineConfig::default(),
        );
        let engine = Arc::new(engine);
        (create_router(AppState::new(engine.clone())), engine)
    }

    async fn send_get(app: &Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn post_form(app: &Router, uri: &str, form: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_set_start_cancel_flow() {
        let (app, engine) = app();

        let (status, _) = post_form(
            &app,
            "/setTrigger",
            "action=BUY&transnum=7&username=alice&stock=ABC&amount=10",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_get(&app, "/waitingTriggers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.lines().count(), 1);
        assert!(body.contains("PENDING BUY 10 shares of ABC for alice @ unset"));

        let (status, _) = send_get(
            &app,
            "/startTrigger?action=BUY&username=alice&stock=ABC&price=50.00",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send_get(&app, "/runningTriggers").await;
        assert_eq!(body.lines().count(), 1);
        assert!(body.contains("@ 50.00"));
        let (_, body) = send_get(&app, "/waitingTriggers").await;
        assert!(body.is_empty());

        let (status, body) = post_form(
            &app,
            "/cancelTrigger",
            "action=BUY&username=alice&stock=ABC",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("CANCELLED BUY 10 shares of ABC for alice @ 50.00"));

        let (_, running) = send_get(&app, "/runningTriggers").await;
        let (_, waiting) = send_get(&app, "/waitingTriggers").await;
        assert!(running.is_empty());
        assert!(waiting.is_empty());

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_validation_rejects_before_mutation() {
        let (app, engine) = app();

        let (status, body) = send_get(
            &app,
            "/setTrigger?action=HOLD&transnum=1&username=alice&stock=ABC&amount=1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("HOLD"));

        let (status, _) = send_get(
            &app,
            "/setTrigger?action=BUY&transnum=one&username=alice&stock=ABC&amount=1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_get(
            &app,
            "/startTrigger?action=BUY&username=alice&stock=ABC&price=cheap",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(engine.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_keys_are_not_found() {
        let (app, _engine) = app();

        let (status, _) = send_get(
            &app,
            "/startTrigger?action=SELL&username=bob&stock=XYZ&price=1",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send_get(&app, "/cancelTrigger?action=SELL&username=bob&stock=XYZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("SELL:XYZ:bob"));
    }

    #[tokio::test]
    async fn test_json_listing() {
        let (app, _engine) = app();
        send_get(
            &app,
            "/setTrigger?action=SELL&transnum=3&username=bob&stock=XYZ&amount=4",
        )
        .await;

        let (status, body) = send_get(&app, "/waitingTriggers?format=json").await;
        assert_eq!(status, StatusCode::OK);
        let triggers: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0]["key"]["action"], "SELL");
        assert_eq!(triggers[0]["share_amount"], 4);
        assert_eq!(triggers[0]["state"], "PENDING");
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let (app, _engine) = app();
        send_get(
            &app,
            "/setTrigger?action=BUY&transnum=1&username=u&stock=ABC&amount=1",
        )
        .await;

        let (status, body) = send_get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");

        let (status, body) = send_get(&app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("trig_registered_total"));
    }
}
