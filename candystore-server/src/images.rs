use std::fmt;

use bson::{Binary, Bson, DateTime, doc, spec::BinarySubtype};
use candystore::{
    collection::CollectionRef,
    envelope::ResultEnvelope,
    query::{Criteria, Filter, Projection},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

/// Identifier of a stored image. Always stored and queried as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An uploaded image, ready to store.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: Option<ImageId>,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Image bytes as returned to clients.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ImageStore {
    images: CollectionRef,
}

impl ImageStore {
    pub fn new(images: CollectionRef) -> Self {
        Self { images }
    }

    /// Stores an image and returns its identifier.
    ///
    /// When no content type accompanies the upload it is guessed from the filename.
    pub async fn store(&self, image: NewImage) -> Result<ImageId, ApiError> {
        let id = image.id.unwrap_or_else(ImageId::generate);
        let content_type = image.content_type.unwrap_or_else(|| {
            mime_guess::from_path(&image.filename)
                .first_or_octet_stream()
                .to_string()
        });
        let size = image.bytes.len() as i64;

        let outcome = self
            .images
            .insert(doc! {
                "_id": id.as_str(),
                "filename": image.filename,
                "content_type": content_type,
                "size": size,
                "data": Binary { subtype: BinarySubtype::Generic, bytes: image.bytes },
                "uploaded_at": DateTime::now(),
            })
            .await;

        if !outcome.success {
            return Err(ApiError::from_outcome(&outcome));
        }
        info!(image_id = %id, size, "stored image");

        Ok(id)
    }

    pub async fn fetch(&self, id: &ImageId) -> Result<Option<StoredImage>, ApiError> {
        let Some(document) = self
            .images
            .find_one(Some(Filter::eq("_id", id.as_str())), None)
            .await?
        else {
            return Ok(None);
        };

        let bytes = match document.get("data") {
            Some(Bson::Binary(binary)) => binary.bytes.clone(),
            _ => return Err(ApiError::internal_server_error(format!("image {id} has no data"))),
        };
        let content_type = document
            .get_str("content_type")
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Some(StoredImage { content_type, bytes }))
    }

    /// Metadata of every stored image, without the binary payload.
    pub async fn list(&self) -> ResultEnvelope {
        self.images
            .get(
                Criteria::builder()
                    .projection(Projection::exclude(["data"]))
                    .build(),
            )
            .await
    }
}
