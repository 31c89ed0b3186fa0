//! MongoDB backend implementation for candystore.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! translating criteria, filters and update payloads into driver calls.
//!
//! To use this backend through the facade, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! candystore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The builder accepts either host, port and optional credentials, or a full connection
//! URL. After connecting, the server is pinged; an unreachable server is logged as a
//! warning and the handle is still returned.
//!
//! # Example
//!
//! ```ignore
//! use candystore::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbStore::builder()
//!         .host("localhost")
//!         .port(27017)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
pub mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
