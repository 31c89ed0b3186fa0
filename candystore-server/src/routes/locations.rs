use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    AppState,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{LocationReport, RadiusQuery},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/post-location", post(post_location))
        .route("/location/{email}", get(latest_location))
        .route("/locations", get(list_locations))
        .route("/locations/within-radius", get(locations_within_radius))
}

async fn post_location(
    State(state): State<Arc<AppState>>,
    ApiJson(report): ApiJson<LocationReport>,
) -> Result<Json<Value>, ApiError> {
    state.locations().post(report).await?;

    Ok(Json(json!({ "message": "Location posted successfully" })))
}

async fn latest_location(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .locations()
        .latest(&email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No locations found for this email"))
}

async fn list_locations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.locations().list().await?))
}

async fn locations_within_radius(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RadiusQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let hits = state
        .locations()
        .within_radius(query.latitude, query.longitude, query.radius)
        .await?;
    if hits.is_empty() {
        return Err(ApiError::not_found("No locations found within the specified radius"));
    }

    Ok(Json(hits))
}
