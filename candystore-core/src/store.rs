//! Main document store interface.
//!
//! A [`DocumentStore`] owns the shared backend and hands out cheap, cloneable handles:
//!
//! - [`DatabaseRef`] - a named database, for collection administration
//! - [`CollectionRef`] - a named collection, for reads and mutations
//!
//! Handles carry their [`Namespace`] explicitly, so concurrent requests never observe
//! each other's collection selection.
//!
//! # Example
//!
//! ```ignore
//! use candystore_core::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let db = store.database("candy_store");
//! db.ensure_collection("candies").await?;
//! let candies = db.collection("candies");
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    backend::{Namespace, StoreBackend},
    collection::CollectionRef,
    document::Record,
    error::DocumentStoreResult,
};

/// A document store bound to a backend.
///
/// Cloning is cheap; every clone shares the same backend.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StoreBackend>,
}

impl DocumentStore {
    /// Creates a new document store with the given backend.
    pub fn new<B: StoreBackend + 'static>(backend: B) -> Self {
        Self { backend: Arc::new(backend) }
    }

    /// Creates a store around an already shared backend.
    pub fn from_shared(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Returns a handle to the named database. The database need not exist yet.
    pub fn database(&self, name: impl Into<String>) -> DatabaseRef {
        DatabaseRef {
            backend: Arc::clone(&self.backend),
            name: name.into(),
        }
    }

    /// Checks that the backend answers.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Lists all databases.
    pub async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_databases().await
    }

    /// Drops a database and all of its collections.
    pub async fn drop_database(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_database(name).await
    }

    /// Shuts down the backend.
    pub async fn shutdown(&self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}

/// A handle to a named database.
#[derive(Debug, Clone)]
pub struct DatabaseRef {
    backend: Arc<dyn StoreBackend>,
    name: String,
}

impl DatabaseRef {
    /// Returns the name of this database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to the named collection.
    pub fn collection(&self, name: impl Into<String>) -> CollectionRef {
        CollectionRef::new(
            Arc::clone(&self.backend),
            Namespace::new(self.name.clone(), name),
        )
    }

    /// Returns a handle to the collection a record type lives in.
    pub fn typed<R: Record>(&self) -> CollectionRef {
        self.collection(R::collection_name())
    }

    /// Lists all collections in this database.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections(&self.name).await
    }

    /// Creates the named collection when it is missing.
    ///
    /// Returns `true` if the collection was created.
    pub async fn ensure_collection(&self, name: &str) -> DocumentStoreResult<bool> {
        let existing = self.backend.list_collections(&self.name).await?;
        if existing.iter().any(|c| c == name) {
            return Ok(false);
        }

        self.backend
            .create_collection(&Namespace::new(self.name.clone(), name))
            .await?;
        info!(database = %self.name, collection = name, "created collection");

        Ok(true)
    }

    /// Drops the named collection.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend
            .drop_collection(&Namespace::new(self.name.clone(), name))
            .await
    }

    /// Creates a unique index on `field` in the named collection.
    pub async fn ensure_unique_index(&self, collection: &str, field: &str) -> DocumentStoreResult<()> {
        self.backend
            .create_index(&Namespace::new(self.name.clone(), collection), field, true)
            .await
    }
}
