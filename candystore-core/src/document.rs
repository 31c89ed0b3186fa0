//! Core traits and helpers for document representation and serialization.
//!
//! Documents travel through the store as plain BSON [`Document`]s. This module provides:
//!
//! - [`Record`] / [`RecordExt`] for typed models that live in a known collection
//! - identifier helpers ([`coerce_id`], [`parse_object_id`], [`id_to_string`])
//! - conversion to JSON with identifiers rendered as strings ([`to_json`], [`document_to_json`])

use bson::{
    Bson, Document,
    de::deserialize_from_bson,
    oid::ObjectId,
    ser::serialize_to_bson,
};
use chrono::SecondsFormat;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Number, Value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A typed model stored in a fixed collection.
///
/// # Example
///
/// ```ignore
/// use candystore_core::document::Record;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Category {
///     pub name: String,
///     pub count: i64,
/// }
///
/// impl Record for Category {
///     fn collection_name() -> &'static str {
///         "categories"
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this record belongs to.
    fn collection_name() -> &'static str;
}

/// Extension trait providing BSON conversion for records.
///
/// Automatically implemented for every [`Record`].
pub trait RecordExt: Record {
    /// Converts this record into a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the record does not serialize to a map.
    fn to_document(&self) -> DocumentStoreResult<Document>;

    /// Creates a record from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: Document) -> DocumentStoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_document(&self) -> DocumentStoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "expected a document, got {:?}",
                other.element_type()
            ))),
        }
    }

    fn from_document(document: Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

/// Coerces an identifier string into the value stored under `_id`.
///
/// Valid 24-character ObjectId hex strings become [`Bson::ObjectId`], anything else is
/// kept as a string so externally keyed documents (images) still match.
pub fn coerce_id(value: &str) -> Bson {
    match ObjectId::parse_str(value) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(value.to_string()),
    }
}

/// Parses an identifier string that must be an ObjectId.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidIdentifier`] when `value` is not a valid ObjectId.
pub fn parse_object_id(value: &str) -> DocumentStoreResult<ObjectId> {
    ObjectId::parse_str(value)
        .map_err(|_| DocumentStoreError::InvalidIdentifier(format!("'{value}' is not a valid ObjectId")))
}

/// Renders an identifier value as a plain string.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Converts a BSON value to JSON, rendering ObjectIds as hex strings and datetimes as
/// RFC 3339 strings at any depth.
pub fn to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)),
        Bson::Document(document) => document_to_json(document),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        other => serde_json::to_value(&other).unwrap_or(Value::Null),
    }
}

/// Converts a whole document to a JSON object with identifiers rendered as strings.
pub fn document_to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

/// Converts a JSON object (typically a request body) into a BSON document.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if `value` is not a JSON object.
pub fn json_to_document(value: &Value) -> DocumentStoreResult<Document> {
    if !value.is_object() {
        return Err(DocumentStoreError::InvalidDocument("expected a JSON object".into()));
    }

    match serialize_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        _ => Err(DocumentStoreError::InvalidDocument("expected a JSON object".into())),
    }
}

/// Converts a JSON value into BSON.
pub fn json_to_bson(value: &Value) -> DocumentStoreResult<Bson> {
    Ok(serialize_to_bson(value)?)
}

/// Returns `document` with `_id` as its first field, generating an ObjectId when absent.
///
/// The identifier is returned alongside the document.
pub fn with_id(mut document: Document) -> (Bson, Document) {
    let id = document
        .remove(ID_FIELD)
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let mut prepared = Document::new();
    prepared.insert(ID_FIELD, id.clone());
    for (key, value) in document {
        prepared.insert(key, value);
    }

    (id, prepared)
}
