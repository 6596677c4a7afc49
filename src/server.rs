use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    error::Error,
    handler::{HandlerResponse, WebhookHandler},
    request::{Envelope, InboundRequest},
};

#[derive(Clone)]
pub struct AppState {
    pub handler: WebhookHandler,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(webhook_info))
        .route("/health", get(health_check))
        .route("/webhook", post(handle_webhook))
        .route("/invoke", post(handle_invoke))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<HandlerResponse>, Error> {
    let request = InboundRequest::from_raw(headers, &body);
    run(&state, &request).await
}

async fn handle_invoke(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<HandlerResponse>, Error> {
    let envelope: Envelope = serde_json::from_slice(&body)
        .map_err(|e| Error::MalformedPayload(format!("invalid invocation envelope: {e}")))?;
    let request = InboundRequest::try_from(envelope)?;
    run(&state, &request).await
}

async fn run(state: &AppState, request: &InboundRequest) -> Result<Json<HandlerResponse>, Error> {
    let event_type = request.event_type().unwrap_or("unknown");
    info!("Received {} event", event_type);

    match state.handler.handle(request).await {
        Ok(response) => Ok(Json(response)),
        Err(err @ Error::AuthenticationFailure(_)) => Err(err),
        Err(err) => {
            error!(kind = err.kind(), "Failed to process {} event: {}", event_type, err);
            Err(err)
        }
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn webhook_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "GitHub issue to project intake",
        "endpoints": {
            "webhook": "/webhook",
            "invoke": "/invoke",
            "health": "/health",
            "info": "/"
        },
        "supported_events": [
            "issues",
            "ping"
        ]
    }))
}
