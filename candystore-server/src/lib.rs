//! HTTP API for the candy store catalog.
//!
//! Routes are grouped by resource under [`routes`]; each group exposes a `router()` that
//! is merged into the application by [`app`].

pub mod accounts;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod locations;
pub mod models;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the application router with CORS, request tracing and the upload size limit.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::candies::router())
        .merge(routes::users::router())
        .merge(routes::locations::router())
        .merge(routes::images::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
