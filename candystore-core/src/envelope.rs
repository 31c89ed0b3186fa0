//! Uniform result shapes returned by collection operations.
//!
//! Reads produce a [`ResultEnvelope`], mutations produce an [`Outcome`]. Neither carries
//! a `Result`: failures are folded into `success == false` plus a message, and an
//! [`Outcome`] additionally remembers the [`Failure`] kind so callers can pick a status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentStoreError;

/// The result of a read.
///
/// # Example
///
/// ```ignore
/// use candystore_core::envelope::ResultEnvelope;
/// use serde_json::json;
///
/// let envelope = ResultEnvelope::ok(vec![json!({ "_id": "1", "name": "Nerds" })]);
/// assert!(envelope.success);
/// assert_eq!(envelope.result_size, 1);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    /// Whether the read succeeded.
    pub success: bool,
    /// Number of documents in `data`.
    pub result_size: usize,
    /// Matching documents with identifiers rendered as strings.
    pub data: Vec<Value>,
    /// Error message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    /// A successful envelope holding `data`.
    pub fn ok(data: Vec<Value>) -> Self {
        Self {
            success: true,
            result_size: data.len(),
            data,
            error: None,
        }
    }

    /// A failed envelope carrying `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result_size: 0,
            data: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Why a mutation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Nothing matched the filter.
    NotFound,
    /// An identifier was not in the expected format.
    InvalidIdentifier,
    /// A unique field or `_id` already exists.
    Duplicate,
    /// The payload or filter was rejected before reaching the store.
    InvalidInput,
    /// The store itself failed.
    Store,
}

impl From<&DocumentStoreError> for Failure {
    fn from(err: &DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::DocumentNotFound(..) | DocumentStoreError::CollectionNotFound(_) => {
                Failure::NotFound
            }
            DocumentStoreError::InvalidIdentifier(_) => Failure::InvalidIdentifier,
            DocumentStoreError::DocumentAlreadyExists(..) => Failure::Duplicate,
            DocumentStoreError::InvalidDocument(_)
            | DocumentStoreError::InvalidQuery(_)
            | DocumentStoreError::InvalidUpdate(_)
            | DocumentStoreError::Serialization(_) => Failure::InvalidInput,
            DocumentStoreError::Initialization(_)
            | DocumentStoreError::Backend(_)
            | DocumentStoreError::Unknown(_) => Failure::Store,
        }
    }
}

/// The result of a mutation.
///
/// Only the counters relevant to the operation are populated; the rest are omitted when
/// serialized.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
    #[serde(skip)]
    pub failure: Option<Failure>,
}

impl Outcome {
    /// Starts building a successful outcome.
    pub fn success() -> OutcomeBuilder {
        OutcomeBuilder::new(true)
    }

    /// Starts building a failed outcome of the given kind.
    pub fn failure(kind: Failure) -> OutcomeBuilder {
        let mut builder = OutcomeBuilder::new(false);
        builder.outcome.failure = Some(kind);
        builder
    }

    /// A failed outcome describing `err`.
    pub fn from_error(err: &DocumentStoreError) -> Self {
        Outcome::failure(Failure::from(err))
            .message(err.to_string())
            .build()
    }

    /// The failure kind, if the mutation did not succeed.
    pub fn failure_kind(&self) -> Option<Failure> {
        self.failure
    }
}

/// Builder for [`Outcome`] values.
pub struct OutcomeBuilder {
    outcome: Outcome,
}

impl OutcomeBuilder {
    fn new(success: bool) -> Self {
        Self {
            outcome: Outcome { success, ..Outcome::default() },
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.outcome.message = Some(message.into());
        self
    }

    pub fn matched_count(mut self, count: u64) -> Self {
        self.outcome.matched_count = Some(count);
        self
    }

    pub fn modified_count(mut self, count: u64) -> Self {
        self.outcome.modified_count = Some(count);
        self
    }

    pub fn deleted_count(mut self, count: u64) -> Self {
        self.outcome.deleted_count = Some(count);
        self
    }

    pub fn inserted_ids(mut self, ids: Vec<String>) -> Self {
        self.outcome.inserted_ids = Some(ids);
        self
    }

    pub fn upserted_id(mut self, id: Option<String>) -> Self {
        self.outcome.upserted_id = id;
        self
    }

    pub fn build(self) -> Outcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_counts_its_data() {
        let envelope = ResultEnvelope::ok(vec![json!({ "a": 1 }), json!({ "a": 2 })]);

        assert_eq!(envelope.result_size, 2);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": true, "result_size": 2, "data": [{ "a": 1 }, { "a": 2 }] })
        );
    }

    #[test]
    fn failed_envelope_reports_error() {
        let envelope = ResultEnvelope::failed("bad filter");

        assert!(!envelope.success);
        assert_eq!(envelope.result_size, 0);
        assert_eq!(envelope.error.as_deref(), Some("bad filter"));
    }

    #[test]
    fn outcome_omits_unset_counters() {
        let outcome = Outcome::failure(Failure::NotFound)
            .message("No matching document found.")
            .matched_count(0)
            .build();

        assert_eq!(outcome.failure_kind(), Some(Failure::NotFound));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": false,
                "message": "No matching document found.",
                "matched_count": 0,
            })
        );
    }

    #[test]
    fn errors_map_to_failure_kinds() {
        let duplicate = DocumentStoreError::DocumentAlreadyExists("1".into(), "images".into());
        let invalid = DocumentStoreError::InvalidIdentifier("x".into());

        assert_eq!(Failure::from(&duplicate), Failure::Duplicate);
        assert_eq!(Outcome::from_error(&invalid).failure_kind(), Some(Failure::InvalidIdentifier));
    }
}
