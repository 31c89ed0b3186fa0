//! Storage backend abstraction for the document store.
//!
//! This module defines the trait that abstracts over different storage implementations,
//! allowing the store to run against MongoDB in production and an in-memory map in tests.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for all storage operations:
//! finds driven by [`Criteria`], inserts, filtered updates and deletes, distinct values and
//! database/collection administration. Every document operation names its target with an
//! explicit [`Namespace`]; backends keep no "current collection" state.
//!
//! Implementations are required to be thread-safe (`Send + Sync`) and are shared as
//! `Arc<dyn StoreBackend>`.
//!
//! # Examples
//!
//! ```ignore
//! use candystore_core::backend::{Namespace, StoreBackend};
//! use bson::doc;
//!
//! let ns = Namespace::new("candy_store", "candies");
//! let id = backend.insert_one(&ns, doc! { "name": "Nerds", "price": 2.5 }).await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::{self, Debug, Display};

use crate::{
    error::DocumentStoreResult,
    query::{Criteria, Expr},
    update::Update,
};

/// The database and collection an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Counters reported by an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
    /// Identifier of the document created by an upsert.
    pub upserted_id: Option<Bson>,
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. The concurrency model (driver pool, read-write lock) is
/// implementation-specific.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Missing databases and collections are never an error: reads return nothing and
/// writes create them.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Checks that the server answers.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Lists the names of all databases.
    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>>;

    /// Drops a database and everything in it.
    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in `database`.
    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>>;

    /// Creates an empty collection.
    ///
    /// # Errors
    ///
    /// Backends may return an error if the collection already exists; use
    /// [`DatabaseRef::ensure_collection`](crate::store::DatabaseRef::ensure_collection)
    /// for create-if-absent.
    async fn create_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()>;

    /// Drops (deletes) a collection and all its documents.
    ///
    /// # Warning
    ///
    /// This operation is irreversible.
    async fn drop_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()>;

    /// Creates an ascending index on `field`, optionally enforcing uniqueness.
    ///
    /// # Note
    ///
    /// If `unique` is true and existing documents violate the constraint, the backend
    /// returns an error.
    async fn create_index(
        &self,
        namespace: &Namespace,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()>;

    /// Finds documents matching `criteria`, applying projection, sort, skip and limit.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidQuery`](crate::error::DocumentStoreError::InvalidQuery)
    /// for filters the backend cannot evaluate.
    async fn find(
        &self,
        namespace: &Namespace,
        criteria: &Criteria,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Inserts one document, returning its `_id` (generated when absent).
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocumentStoreResult<Bson>;

    /// Inserts several documents in order, returning their `_id`s.
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// With `upsert`, a document is created from the filter's equality terms when nothing
    /// matches.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Applies `update` to every document matching `filter`.
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Deletes at most one matching document, returning how many were removed.
    async fn delete_one(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64>;

    /// Deletes every matching document, returning how many were removed.
    async fn delete_many(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64>;

    /// Returns the distinct values of `field` among matching documents.
    async fn distinct(
        &self,
        namespace: &Namespace,
        field: &str,
        filter: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with external connections
    /// should override this.
    async fn shutdown(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
