//! Update payloads.
//!
//! A payload is either a plain set of fields, which the backend applies as `$set`, or a
//! document made entirely of update operators (`$set`, `$unset`, `$inc`, ...). Payloads
//! that mix both are rejected before they reach a backend.

use bson::{Bson, Document, doc};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// An update to apply to matching documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Plain fields, wrapped in `$set` when applied.
    Set(Document),
    /// A document whose keys are all update operators.
    Operators(Document),
}

impl Update {
    /// Classifies a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidUpdate`] if the payload is empty or mixes
    /// operator keys with plain field keys.
    pub fn from_payload(payload: Document) -> DocumentStoreResult<Self> {
        if payload.is_empty() {
            return Err(DocumentStoreError::InvalidUpdate("update payload is empty".into()));
        }

        let operators = payload
            .keys()
            .filter(|key| key.starts_with('$'))
            .count();

        match operators {
            0 => Ok(Update::Set(payload)),
            n if n == payload.len() => Ok(Update::Operators(payload)),
            _ => Err(DocumentStoreError::InvalidUpdate(
                "update payload mixes operators with plain fields".into(),
            )),
        }
    }

    /// An update setting a single field.
    pub fn set(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let mut fields = Document::new();
        fields.insert(field.into(), value.into());
        Update::Set(fields)
    }

    /// Returns the operator document sent to the store.
    pub fn into_document(self) -> Document {
        match self {
            Update::Set(fields) => doc! { "$set": fields },
            Update::Operators(operators) => operators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_payloads_are_wrapped_in_set() {
        let update = Update::from_payload(doc! { "price": 2.0 }).unwrap();

        assert_eq!(update.into_document(), doc! { "$set": { "price": 2.0 } });
    }

    #[test]
    fn operator_payloads_pass_through() {
        let payload = doc! { "$inc": { "count": 1 }, "$unset": { "legacy": "" } };
        let update = Update::from_payload(payload.clone()).unwrap();

        assert_eq!(update.into_document(), payload);
    }

    #[test]
    fn mixed_payloads_are_rejected() {
        let err = Update::from_payload(doc! { "$set": { "a": 1 }, "b": 2 }).unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidUpdate(_)));
        assert!(Update::from_payload(Document::new()).is_err());
    }
}
