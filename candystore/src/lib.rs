//! Main candystore crate providing a unified interface to the catalog's document storage.
//!
//! This crate is the entry point for users of the candystore data-access layer. It
//! re-exports the core types from the sub-crates and provides access to the storage
//! backends.
//!
//! # Features
//!
//! - **Explicit namespaces** - Every collection handle names its database and collection
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//! - **Typed criteria** - Filters, projections, multi-key sorts, skip and limit
//! - **Uniform results** - Reads return envelopes, mutations return outcomes
//!
//! # Quick Start
//!
//! ```ignore
//! use candystore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!     let candies = store.database("candy_store").collection("candies");
//!
//!     candies
//!         .insert(vec![
//!             doc! { "name": "Nerds", "category": "Sour", "price": 2.5 },
//!             doc! { "name": "Gobstopper", "category": "Hard", "price": 1.0 },
//!         ])
//!         .await;
//!
//!     let cheap = candies
//!         .get(
//!             Criteria::builder()
//!                 .filter(Filter::lte("price", 2.0))
//!                 .projection(Projection::include(["name", "price"]).without_id())
//!                 .build(),
//!         )
//!         .await;
//!
//!     println!("Cheap candies: {:?}", cheap.data);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use candystore_core::{backend, collection, document, envelope, error, query, store, update};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use candystore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use candystore_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
