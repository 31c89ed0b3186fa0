//! Errors raised by the data-access layer.
//!
//! Fallible operations return [`DocumentStoreResult<T>`]. Collection handles fold these
//! errors into envelopes and outcomes, so callers of
//! [`CollectionRef::get`](crate::collection::CollectionRef::get) never see them directly.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A value could not be converted between BSON, JSON and Rust types.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The backend could not be configured or reached while being built.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A unique key is already taken. Holds the offending key and the collection.
    #[error("Duplicate key {0} in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// Holds the identifier that was looked up and the collection.
    #[error("No document {0} in collection {1}")]
    DocumentNotFound(String, String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The payload is not a document, or not the kind of document expected.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The filter, projection or sort could not be evaluated.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// The update payload mixes operators with plain fields or uses an unsupported operator.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// An identifier string is not in the format the store expects.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// The driver or storage engine reported a failure.
    #[error("Store error: {0}")]
    Backend(String),
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_serialization_errors() {
        let err: DocumentStoreError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();

        assert!(matches!(err, DocumentStoreError::Serialization(_)));
    }

    #[test]
    fn duplicate_key_names_the_collection() {
        let err = DocumentStoreError::DocumentAlreadyExists("email".into(), "users".into());

        assert_eq!(err.to_string(), "Duplicate key email in collection users");
    }
}
