use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use candystore::{
    envelope::{Failure, Outcome},
    error::DocumentStoreError,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by the HTTP handlers, rendered as `{"detail": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn unprocessable_entity<S: Into<String>>(message: S) -> Self {
        Self::UnprocessableEntity { message: message.into() }
    }

    pub fn internal_server_error<S: Into<String>>(message: S) -> Self {
        Self::InternalServerError { message: message.into() }
    }

    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The message shown to clients. Internal causes are never exposed.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::UnprocessableEntity { message }
            | ApiError::ServiceUnavailable { message } => message.clone(),
            ApiError::InternalServerError { .. } => "An internal error occurred".to_string(),
        }
    }

    /// Maps a failed mutation outcome to the matching HTTP error.
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let message = outcome.message.clone().unwrap_or_default();

        Self::from_failure(outcome.failure_kind().unwrap_or(Failure::Store), message)
    }

    fn from_failure(kind: Failure, message: String) -> Self {
        match kind {
            Failure::NotFound => Self::NotFound { message },
            Failure::InvalidIdentifier | Failure::InvalidInput => Self::BadRequest { message },
            Failure::Duplicate => Self::Conflict { message },
            Failure::Store => Self::InternalServerError { message },
        }
    }
}

impl From<DocumentStoreError> for ApiError {
    fn from(err: DocumentStoreError) -> Self {
        Self::from_failure(Failure::from(&err), err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Well-formed JSON of the wrong shape is a 422; anything else about the body is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => Self::unprocessable_entity(rejection.body_text()),
            _ => Self::bad_request(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, Json(json!({ "detail": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = ApiError::from(DocumentStoreError::Backend("connection reset by peer".into()));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn outcome_failures_map_to_statuses() {
        let not_found = Outcome::failure(Failure::NotFound).message("Document not found.").build();
        let invalid = Outcome::failure(Failure::InvalidIdentifier)
            .message("Invalid ObjectId format.")
            .build();
        let duplicate = Outcome::failure(Failure::Duplicate).build();

        assert_eq!(ApiError::from_outcome(&not_found).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from_outcome(&not_found).user_message(), "Document not found.");
        assert_eq!(ApiError::from_outcome(&invalid).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from_outcome(&duplicate).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_input_errors_are_bad_requests() {
        let err = ApiError::from(DocumentStoreError::InvalidUpdate("the _id field is immutable".into()));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
