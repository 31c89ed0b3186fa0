//! In-memory document storage backend for candystore.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Query support** - Filters, projections, multi-key sorts, skip and limit
//! - **Update operators** - `$set`, `$unset` and `$inc`, with upsert
//! - **Unique indexes** - Enforced on insert and update
//!
//! # Quick Start
//!
//! ```ignore
//! use candystore::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!     let candies = store.database("candy_store").collection("candies");
//!
//!     candies.insert(bson::doc! { "name": "Nerds", "price": 2.5 }).await;
//!     assert_eq!(candies.get(Criteria::all()).await.result_size, 1);
//! }
//! ```

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
