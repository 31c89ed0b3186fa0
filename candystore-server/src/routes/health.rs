use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Result<(StatusCode, Json<Value>), ApiError> {
    match state.store.ping().await {
        Ok(()) => Ok((StatusCode::OK, Json(json!({ "status": "ok" })))),
        Err(err) => {
            warn!(error = %err, "health check failed");
            Err(ApiError::service_unavailable("Document store unavailable"))
        }
    }
}
