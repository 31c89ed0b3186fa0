//! Convenient re-exports of commonly used types from candystore.
//!
//! ```ignore
//! use candystore::prelude::*;
//! ```
//!
//! This provides access to:
//! - Store, database and collection handles
//! - Records and identifier helpers
//! - Criteria construction and filtering
//! - Envelopes, outcomes and error types

pub use candystore_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder, UpdateResult},
    collection::{CollectionRef, InsertPayload, UpdateScope},
    document::{Record, RecordExt, coerce_id, document_to_json, json_to_document},
    envelope::{Failure, Outcome, ResultEnvelope},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Criteria, CriteriaBuilder, Expr, FieldOp, Filter, Projection, Sort, SortDirection},
    store::{DatabaseRef, DocumentStore},
    update::Update,
};
