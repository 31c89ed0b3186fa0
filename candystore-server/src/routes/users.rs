use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use candystore::{
    envelope::Outcome,
    query::{Criteria, Projection},
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    AppState,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{UserLogin, UserRegistration},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/user/{email}", get(get_user))
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let criteria = Criteria::builder()
        .projection(Projection::exclude(["password"]))
        .build();

    let envelope = state.users().get(criteria).await;
    if !envelope.success {
        return Err(ApiError::internal_server_error(format!(
            "Failed to retrieve users: {}",
            envelope.error.unwrap_or_default()
        )));
    }

    Ok(Json(envelope.data))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .accounts()
        .find_by_email(&email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(registration): ApiJson<UserRegistration>,
) -> Result<Json<Outcome>, ApiError> {
    Ok(Json(state.accounts().register(registration).await?))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(credentials): ApiJson<UserLogin>,
) -> Result<Json<Outcome>, ApiError> {
    Ok(Json(state.accounts().login(credentials).await?))
}
