use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post, put},
};
use candystore::{
    document::{ID_FIELD, json_to_bson, json_to_document, parse_object_id, to_json},
    envelope::{Outcome, ResultEnvelope},
    query::{Criteria, Filter, Projection, SortDirection},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::{
    AppState,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{Candy, FieldUpdate, Pagination, PriceRange},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/candies", get(list_candies))
        .route("/candies", post(add_candy))
        .route("/candies/categories", get(candy_categories))
        .route("/categories", get(list_categories))
        .route("/candies/category/{category}", get(candies_in_category))
        .route("/candies/category/{category}", delete(delete_category))
        .route("/candies/id/{id}", get(candy_by_catalog_id))
        .route("/candies/id/{id}", patch(update_candy_field))
        .route("/candies/price", get(candies_by_price))
        .route("/candies/{id}", put(update_candy))
        .route("/candies/{id}", delete(delete_candy))
}

fn envelope_or_error(envelope: ResultEnvelope) -> Result<Json<ResultEnvelope>, ApiError> {
    if envelope.success {
        Ok(Json(envelope))
    } else {
        Err(ApiError::internal_server_error(envelope.error.unwrap_or_default()))
    }
}

async fn list_candies(
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let criteria = Criteria::builder().skip(page.skip).limit(page.limit).build();

    envelope_or_error(state.candies().get(criteria).await)
}

async fn candy_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    let categories = state.candies().distinct("category", None).await?;

    Ok(Json(categories.into_iter().map(to_json).collect()))
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<ResultEnvelope>, ApiError> {
    let criteria = Criteria::builder()
        .projection(Projection::include(["name", "count"]).without_id())
        .sort("name", SortDirection::Asc)
        .build();

    envelope_or_error(state.categories().get(criteria).await)
}

async fn candies_in_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let criteria = Criteria::builder()
        .filter(Filter::eq("category", category))
        .projection(Projection::include(["name", "price"]).without_id())
        .build();

    envelope_or_error(state.candies().get(criteria).await)
}

async fn candy_by_catalog_id(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let criteria = Criteria::builder().filter(Filter::eq("id", id)).build();

    envelope_or_error(state.candies().get(criteria).await)
}

/// A dotted path with no empty segments, no `$` operators and not rooted at `_id`.
fn is_updatable_field(field: &str) -> bool {
    let mut segments = field.split('.');
    let root = segments.next().unwrap_or_default();

    root != ID_FIELD && std::iter::once(root).chain(segments).all(|s| !s.is_empty() && !s.starts_with('$'))
}

async fn update_candy_field(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<FieldUpdate>,
) -> Result<Json<Outcome>, ApiError> {
    if !is_updatable_field(&body.field) {
        return Err(ApiError::bad_request(format!("Field '{}' cannot be updated", body.field)));
    }
    let value = json_to_bson(&body.value)?;

    let outcome = state.candies().put_field("id", &id, &body.field, value).await;
    if !outcome.success {
        return Err(ApiError::from_outcome(&outcome));
    }

    Ok(Json(outcome))
}

async fn candies_by_price(
    State(state): State<Arc<AppState>>,
    ApiQuery(range): ApiQuery<PriceRange>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    if range.min_price <= 0.0 || range.max_price <= 0.0 {
        return Err(ApiError::bad_request("Prices must be greater than zero"));
    }
    if range.min_price > range.max_price {
        return Err(ApiError::bad_request("min_price must not exceed max_price"));
    }

    let criteria = Criteria::builder()
        .filter(Filter::gte("price", range.min_price).and(Filter::lte("price", range.max_price)))
        .projection(Projection::include(["name", "price", "category"]).without_id())
        .sort("price", SortDirection::Asc)
        .build();

    envelope_or_error(state.candies().get(criteria).await)
}

async fn add_candy(
    State(state): State<Arc<AppState>>,
    ApiJson(candy): ApiJson<Candy>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let outcome = state.candies().insert_record(&candy).await;
    if !outcome.success {
        return Err(ApiError::from_outcome(&outcome));
    }

    let id = outcome
        .inserted_ids
        .and_then(|ids| ids.into_iter().next())
        .unwrap_or_default();
    info!(candy = %candy.name, id = %id, "added candy");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Candy added successfully", "id": id })),
    ))
}

async fn update_candy(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    let object_id = parse_object_id(&id).map_err(|_| ApiError::bad_request("Invalid ObjectId format."))?;
    let payload = json_to_document(&body)?;
    if payload.is_empty() {
        return Err(ApiError::bad_request("Update payload must not be empty"));
    }

    let outcome = state
        .candies()
        .update(Some(Filter::eq(ID_FIELD, object_id)), payload, false)
        .await;
    if !outcome.success {
        return Err(ApiError::from_outcome(&outcome));
    }
    if outcome.matched_count.unwrap_or(0) == 0 {
        return Err(ApiError::not_found("Candy not found"));
    }

    Ok(Json(json!({
        "message": "Candy info updated successfully",
        "matched_count": outcome.matched_count,
        "modified_count": outcome.modified_count,
    })))
}

async fn delete_candy(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.candies().delete_by_id(&id).await;
    if !outcome.success {
        return Err(ApiError::from_outcome(&outcome));
    }

    Ok(Json(json!({ "message": "Candy deleted successfully" })))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.candies().delete_many(Some(Filter::eq("category", category))).await;
    if !outcome.success {
        return Err(ApiError::from_outcome(&outcome));
    }

    Ok(Json(json!({
        "message": outcome.message,
        "deleted_count": outcome.deleted_count.unwrap_or(0),
    })))
}

#[cfg(test)]
mod tests {
    use super::is_updatable_field;

    #[test]
    fn field_paths_are_checked_before_reaching_the_store() {
        assert!(is_updatable_field("price"));
        assert!(is_updatable_field("nutrition.sugar"));

        for field in ["", "_id", "_id.x", "$set", "a.$b", "a..b", ".a", "a."] {
            assert!(!is_updatable_field(field), "{field:?} should be rejected");
        }
    }
}
