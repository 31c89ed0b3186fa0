//! Filter evaluation over in-memory documents.
//!
//! Comparison, equality and cross-type ordering follow MongoDB's query semantics closely
//! enough for the catalog's filters to behave the same on both backends.

use std::cmp::Ordering;
use bson::{Bson, DateTime, Document, oid::ObjectId};

use candystore_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, QueryVisitor},
};

/// A borrowed view of a BSON value that can be compared and sorted.
///
/// Integers and doubles collapse into `Number`. Documents keep their field order, so two
/// embedded documents are equal only when their fields appear in the same order. Kinds
/// are listed in MongoDB's cross-type sort order.
#[derive(Debug, PartialEq)]
pub(crate) enum Comparable<'a> {
    /// Also stands in for BSON types the catalog never compares (regex, code, ...).
    Null,
    Number(f64),
    String(&'a str),
    Map(Vec<(&'a str, Comparable<'a>)>),
    Array(Vec<Comparable<'a>>),
    Binary(&'a [u8]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Number(_) => 1,
            Self::String(_) => 2,
            Self::Map(_) => 3,
            Self::Array(_) => 4,
            Self::Binary(_) => 5,
            Self::ObjectId(_) => 6,
            Self::Bool(_) => 7,
            Self::DateTime(_) => 8,
        }
    }

    /// Total order used for sorting: same-kind values compare directly, everything else
    /// falls back to the kind rank.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Int32(n) => Self::Number(f64::from(*n)),
            Bson::Int64(n) => Self::Number(*n as f64),
            Bson::Double(n) => Self::Number(*n),
            Bson::String(s) => Self::String(s.as_str()),
            Bson::Boolean(b) => Self::Bool(*b),
            Bson::DateTime(dt) => Self::DateTime(*dt),
            Bson::ObjectId(oid) => Self::ObjectId(*oid),
            Bson::Binary(binary) => Self::Binary(binary.bytes.as_slice()),
            Bson::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Bson::Document(document) => Self::Map(
                document
                    .iter()
                    .map(|(key, value)| (key.as_str(), Self::from(value)))
                    .collect(),
            ),
            _ => Self::Null,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            (Self::ObjectId(a), Self::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;

    for part in parts {
        current = current.as_document()?.get(part)?;
    }

    Some(current)
}

fn string_operand<'v>(op: &FieldOp, value: &'v Bson) -> DocumentStoreResult<&'v str> {
    value.as_str().ok_or_else(|| {
        DocumentStoreError::InvalidQuery(format!("{op:?} operator requires a string value"))
    })
}

fn array_operand<'v>(op: &FieldOp, value: &'v Bson) -> DocumentStoreResult<&'v Vec<Bson>> {
    value.as_array().ok_or_else(|| {
        DocumentStoreError::InvalidQuery(format!("{op:?} operator requires an array value"))
    })
}

/// Matches `value` against a stored field, treating arrays as "any element matches"
/// the way MongoDB does for scalar operands.
fn matches_value(field_value: &Bson, value: &Bson) -> bool {
    let operand = Comparable::from(value);

    match field_value {
        Bson::Array(items) if !matches!(value, Bson::Array(_)) => items
            .iter()
            .any(|item| Comparable::from(item) == operand),
        _ => Comparable::from(field_value) == operand,
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns the documents matching `expr`, failing on the first expression that
    /// cannot be evaluated.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<&'a Document>> {
        let mut matched = Vec::new();

        for document in documents {
            let keep = match expr {
                Some(expr) => DocumentEvaluator::new(document).evaluate(expr)?,
                None => true,
            };

            if keep {
                matched.push(document);
            }
        }

        Ok(matched)
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, present: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == present)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field_value = match lookup(self.document, field) {
            Some(field_value) => field_value,
            // A missing field compares like null and never satisfies range or string tests.
            None => {
                return Ok(match op {
                    FieldOp::Eq => matches!(value, Bson::Null),
                    FieldOp::Ne => !matches!(value, Bson::Null),
                    FieldOp::NotContains | FieldOp::NoneOf => true,
                    FieldOp::Contains | FieldOp::StartsWith | FieldOp::EndsWith => {
                        match value {
                            Bson::String(_) | Bson::Array(_) => false,
                            _ => return Err(DocumentStoreError::InvalidQuery(format!(
                                "{op:?} operator requires a string or array value"
                            ))),
                        }
                    }
                    _ => false,
                });
            }
        };

        match op {
            FieldOp::Eq => Ok(matches_value(field_value, value)),
            FieldOp::Ne => Ok(!matches_value(field_value, value)),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => Ok(match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }),
                    None => Ok(false),
                }
            }
            FieldOp::Contains | FieldOp::NotContains => {
                let found = match value {
                    Bson::String(needle) => field_value
                        .as_str()
                        .map(|haystack| haystack.to_lowercase().contains(&needle.to_lowercase()))
                        .unwrap_or(false),
                    Bson::Array(needles) => match field_value {
                        Bson::Array(items) => needles.iter().all(|needle| {
                            items
                                .iter()
                                .any(|item| Comparable::from(item) == Comparable::from(needle))
                        }),
                        _ => false,
                    },
                    _ => {
                        return Err(DocumentStoreError::InvalidQuery(format!(
                            "{op:?} operator requires a string or array value"
                        )));
                    }
                };

                Ok(if *op == FieldOp::Contains { found } else { !found })
            }
            FieldOp::StartsWith => {
                let prefix = string_operand(op, value)?.to_lowercase();
                Ok(field_value
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().starts_with(&prefix)))
            }
            FieldOp::EndsWith => {
                let suffix = string_operand(op, value)?.to_lowercase();
                Ok(field_value
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().ends_with(&suffix)))
            }
            FieldOp::AnyOf => Ok(array_operand(op, value)?
                .iter()
                .any(|candidate| matches_value(field_value, candidate))),
            FieldOp::NoneOf => Ok(!array_operand(op, value)?
                .iter()
                .any(|candidate| matches_value(field_value, candidate))),
        }
    }
}
