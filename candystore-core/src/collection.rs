//! Collection handles for reads and mutations.
//!
//! A [`CollectionRef`] names one collection through its [`Namespace`] and exposes the
//! data-access operations the HTTP layer calls. Reads return a [`ResultEnvelope`] and
//! mutations return an [`Outcome`]; backend errors are logged and folded into those
//! shapes rather than propagated.
//!
//! # Example
//!
//! ```ignore
//! use candystore_core::query::{Criteria, Filter};
//! use bson::doc;
//!
//! let candies = store.database("candy_store").collection("candies");
//! candies.insert(doc! { "name": "Nerds", "category": "Sour", "price": 2.5 }).await;
//!
//! let sour = candies
//!     .get(Criteria::builder().filter(Filter::eq("category", "Sour")).build())
//!     .await;
//! assert!(sour.success);
//! ```

use bson::{Bson, Document};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    backend::{Namespace, StoreBackend, UpdateResult},
    document::{ID_FIELD, Record, RecordExt, document_to_json, id_to_string, parse_object_id},
    envelope::{Failure, Outcome, ResultEnvelope},
    error::DocumentStoreResult,
    query::{Criteria, Expr, Filter, Projection},
    update::Update,
};

/// What to insert: one document or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertPayload {
    One(Document),
    Many(Vec<Document>),
}

impl From<Document> for InsertPayload {
    fn from(document: Document) -> Self {
        InsertPayload::One(document)
    }
}

impl From<Vec<Document>> for InsertPayload {
    fn from(documents: Vec<Document>) -> Self {
        InsertPayload::Many(documents)
    }
}

/// How many matching documents an update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    First,
    All,
}

/// A handle to a named collection.
///
/// Cloning is cheap and the handle holds no mutable state.
#[derive(Debug, Clone)]
pub struct CollectionRef {
    backend: Arc<dyn StoreBackend>,
    namespace: Namespace,
}

impl CollectionRef {
    pub(crate) fn new(backend: Arc<dyn StoreBackend>, namespace: Namespace) -> Self {
        Self { backend, namespace }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.namespace.collection
    }

    /// Returns the namespace this handle targets.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Runs a find and returns every match as JSON with identifiers rendered as strings.
    ///
    /// Never fails: a backend or filter error yields `success == false` with the error
    /// message, and a filter matching nothing yields an empty successful envelope.
    pub async fn get(&self, criteria: Criteria) -> ResultEnvelope {
        match self.find(&criteria).await {
            Ok(documents) => ResultEnvelope::ok(documents.into_iter().map(document_to_json).collect()),
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "find failed");
                ResultEnvelope::failed(err.to_string())
            }
        }
    }

    /// Runs a find and returns the raw documents.
    pub async fn find(&self, criteria: &Criteria) -> DocumentStoreResult<Vec<Document>> {
        self.backend.find(&self.namespace, criteria).await
    }

    /// Returns the first document matching `filter`, in `_id` order.
    pub async fn find_one(
        &self,
        filter: Option<Expr>,
        projection: Option<Projection>,
    ) -> DocumentStoreResult<Option<Document>> {
        let criteria = Criteria {
            filter,
            projection,
            limit: 1,
            ..Criteria::default()
        };

        Ok(self
            .backend
            .find(&self.namespace, &criteria)
            .await?
            .into_iter()
            .next())
    }

    /// Runs a find and deserializes every match into `R`.
    pub async fn find_records<R: Record>(&self, criteria: &Criteria) -> DocumentStoreResult<Vec<R>> {
        self.find(criteria)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }

    /// Returns the distinct values of `field` among documents matching `filter`.
    pub async fn distinct(&self, field: &str, filter: Option<Expr>) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .distinct(&self.namespace, field, filter.as_ref())
            .await
    }

    /// Inserts one document or a batch.
    ///
    /// The outcome lists the inserted identifiers as strings. An empty batch is a
    /// successful no-op.
    pub async fn insert(&self, payload: impl Into<InsertPayload>) -> Outcome {
        let result = match payload.into() {
            InsertPayload::One(document) => self
                .backend
                .insert_one(&self.namespace, document)
                .await
                .map(|id| vec![id]),
            InsertPayload::Many(documents) if documents.is_empty() => Ok(Vec::new()),
            InsertPayload::Many(documents) => self.backend.insert_many(&self.namespace, documents).await,
        };

        match result {
            Ok(ids) => {
                debug!(namespace = %self.namespace, count = ids.len(), "inserted documents");
                Outcome::success()
                    .inserted_ids(ids.iter().map(id_to_string).collect())
                    .build()
            }
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "insert failed");
                Outcome::from_error(&err)
            }
        }
    }

    /// Serializes and inserts a typed record.
    pub async fn insert_record<R: Record>(&self, record: &R) -> Outcome {
        match record.to_document() {
            Ok(document) => self.insert(document).await,
            Err(err) => Outcome::from_error(&err),
        }
    }

    /// Updates every document matching `filter`.
    ///
    /// A payload without operator keys is applied as `$set`. With `upsert`, a document
    /// is created when nothing matches.
    pub async fn update(&self, filter: Option<Expr>, payload: Document, upsert: bool) -> Outcome {
        let result = match Update::from_payload(payload) {
            Ok(update) => {
                self.apply_update(filter.as_ref(), &update, UpdateScope::All, upsert)
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(counts) => Outcome::success()
                .matched_count(counts.matched_count)
                .modified_count(counts.modified_count)
                .upserted_id(counts.upserted_id.as_ref().map(id_to_string))
                .build(),
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "update failed");
                Outcome::from_error(&err)
            }
        }
    }

    /// Applies an already classified update and returns the raw counters.
    pub async fn apply_update(
        &self,
        filter: Option<&Expr>,
        update: &Update,
        scope: UpdateScope,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        match scope {
            UpdateScope::First => {
                self.backend
                    .update_one(&self.namespace, filter, update, upsert)
                    .await
            }
            UpdateScope::All => {
                self.backend
                    .update_many(&self.namespace, filter, update, upsert)
                    .await
            }
        }
    }

    /// Sets one field on the first document where `id_key == id_value`.
    ///
    /// When `id_key` is `_id`, ObjectId hex strings are coerced. Reports
    /// "No matching document found." with `matched_count == 0` when nothing matches.
    pub async fn put_field(
        &self,
        id_key: &str,
        id_value: &str,
        field: &str,
        value: impl Into<Bson>,
    ) -> Outcome {
        let filter = if id_key == ID_FIELD {
            Filter::id(id_value)
        } else {
            Filter::eq(id_key, id_value)
        };
        let update = Update::set(field, value);

        match self
            .apply_update(Some(&filter), &update, UpdateScope::First, false)
            .await
        {
            Ok(counts) if counts.matched_count == 0 => Outcome::failure(Failure::NotFound)
                .message("No matching document found.")
                .matched_count(0)
                .build(),
            Ok(counts) => Outcome::success()
                .matched_count(counts.matched_count)
                .modified_count(counts.modified_count)
                .build(),
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "field update failed");
                Outcome::from_error(&err)
            }
        }
    }

    /// Deletes at most one document matching `filter`.
    pub async fn delete_one(&self, filter: Option<Expr>) -> Outcome {
        match self
            .backend
            .delete_one(&self.namespace, filter.as_ref())
            .await
        {
            Ok(0) => Outcome::failure(Failure::NotFound)
                .message("Document not found.")
                .deleted_count(0)
                .build(),
            Ok(deleted) => Outcome::success()
                .message("Document deleted successfully.")
                .deleted_count(deleted)
                .build(),
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "delete failed");
                Outcome::failure(Failure::from(&err))
                    .message(format!("Error occurred while deleting data: {err}"))
                    .build()
            }
        }
    }

    /// Deletes the document whose `_id` is the ObjectId `id`.
    ///
    /// Rejects malformed identifiers with "Invalid ObjectId format." before touching the
    /// store.
    pub async fn delete_by_id(&self, id: &str) -> Outcome {
        match parse_object_id(id) {
            Ok(oid) => self.delete_one(Some(Filter::eq(ID_FIELD, oid))).await,
            Err(err) => Outcome::failure(Failure::from(&err))
                .message("Invalid ObjectId format.")
                .build(),
        }
    }

    /// Deletes every document matching `filter`. Zero deletions is still a success.
    pub async fn delete_many(&self, filter: Option<Expr>) -> Outcome {
        match self
            .backend
            .delete_many(&self.namespace, filter.as_ref())
            .await
        {
            Ok(deleted) => Outcome::success()
                .message(format!("{deleted} document(s) deleted."))
                .deleted_count(deleted)
                .build(),
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "bulk delete failed");
                Outcome::from_error(&err)
            }
        }
    }
}

