use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use candystore::envelope::ResultEnvelope;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    AppState,
    error::ApiError,
    extract::{ApiMultipart, ApiPath},
    images::{ImageId, NewImage},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-image", post(upload_image))
        .route("/images", get(list_images))
        .route("/images/{id}", get(get_image))
}

/// Accepts a multipart form with a `file` part and an optional `image_id` text part.
async fn upload_image(
    State(state): State<Arc<AppState>>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<Json<Value>, ApiError> {
    let mut image_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            Some("image_id") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    image_id = Some(ImageId::from(value.trim()));
                }
            }
            _ => {}
        }
    }

    let Some((filename, content_type, bytes)) = file else {
        return Err(ApiError::bad_request("Missing 'file' field"));
    };
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let id = state
        .images()
        .store(NewImage {
            id: image_id,
            filename,
            content_type,
            bytes,
        })
        .await?;

    Ok(Json(json!({ "message": "Image uploaded successfully", "image_id": id })))
}

async fn list_images(State(state): State<Arc<AppState>>) -> Result<Json<ResultEnvelope>, ApiError> {
    let envelope = state.images().list().await;
    if !envelope.success {
        return Err(ApiError::internal_server_error(envelope.error.unwrap_or_default()));
    }

    Ok(Json(envelope))
}

async fn get_image(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Response, ApiError> {
    let image = state
        .images()
        .fetch(&ImageId::from(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found in the database."))?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}
