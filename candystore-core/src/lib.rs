//! A thin data-access layer over a document database, used by the candy store API.
//!
//! This crate is the core of the candystore project and provides:
//!
//! - **Document helpers** ([`document`]) - Typed records, identifier coercion and JSON rendering
//! - **Store backend abstraction** ([`backend`]) - The trait every storage backend implements
//! - **Query and filtering API** ([`query`]) - Typed criteria, filter expressions and projections
//! - **Update payloads** ([`update`]) - Implicit `$set` wrapping and operator validation
//! - **Result shapes** ([`envelope`]) - Read envelopes and mutation outcomes
//! - **Collections interface** ([`collection`]) - Reads and mutations on a named collection
//! - **Document store** ([`store`]) - Shared store, database and collection handles
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use candystore_core::{query::{Criteria, Filter}, store::DocumentStore};
//!
//! let store = DocumentStore::new(backend);
//! let candies = store.database("candy_store").collection("candies");
//!
//! let envelope = candies
//!     .get(Criteria::builder().filter(Filter::eq("category", "Sour")).build())
//!     .await;
//! println!("{} sour candies", envelope.result_size);
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod envelope;
pub mod error;
pub mod query;
pub mod store;
pub mod update;
