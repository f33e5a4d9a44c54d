//! HTTP surface.

use crate::Dispatcher;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Path the platform posts interactions to.
pub const INTERACTIONS_PATH: &str = "/interactions";

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let max_body_bytes = dispatcher.config().max_body_bytes();
    Router::new()
        .route(INTERACTIONS_PATH, post(interactions))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Serve until `shutdown` resolves. Handler tasks still running at that
/// point are not waited for.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, bot = %dispatcher.config().bot_name(), "Listening for interactions");
    }
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn interactions(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match dispatcher.handle_request(&headers, &body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}
