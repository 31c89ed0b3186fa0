//! Query translation from candystore criteria to MongoDB query syntax.
//!
//! This module translates filter expressions, projections and sort keys into the
//! BSON documents the MongoDB query engine expects.

use bson::{Bson, Document, doc};

use candystore_core::{
    error::DocumentStoreError,
    query::{Criteria, Expr, FieldOp, Projection, QueryVisitor, SortDirection},
};

/// Characters with special meaning inside a regular expression.
const REGEX_SPECIAL: &[char] = &['\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$'];

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if REGEX_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn string_operand<'v>(op: &FieldOp, value: &'v Bson) -> Result<&'v str, DocumentStoreError> {
    value.as_str().ok_or_else(|| {
        DocumentStoreError::InvalidQuery(format!("{op:?} operator requires a string value"))
    })
}

/// Translates filter expressions into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait to convert abstract
/// query expressions into MongoDB's native BSON query syntax.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Returns the filter document for `expr`, matching everything when absent.
    pub(crate) fn filter(expr: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // `$not` only applies to field operators; `$nor` negates a whole expression.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, present: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": present },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": escape_regex(s), "$options": "i" },
                    Bson::Array(arr) => doc! { "$all": arr },
                    _ => return Err(DocumentStoreError::InvalidQuery(
                        "Contains operator requires a string or array value".to_string(),
                    )),
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": { "$regex": escape_regex(s), "$options": "i" } },
                    Bson::Array(arr) => doc! { "$not": { "$all": arr } },
                    _ => return Err(DocumentStoreError::InvalidQuery(
                        "NotContains operator requires a string or array value".to_string(),
                    )),
                },
                FieldOp::StartsWith => doc! {
                    "$regex": format!("^{}", escape_regex(string_operand(op, value)?)),
                    "$options": "i",
                },
                FieldOp::EndsWith => doc! {
                    "$regex": format!("{}$", escape_regex(string_operand(op, value)?)),
                    "$options": "i",
                },
                FieldOp::AnyOf => match value {
                    Bson::Array(_) => doc! { "$in": value },
                    _ => return Err(DocumentStoreError::InvalidQuery(
                        "AnyOf operator requires an array value".to_string(),
                    )),
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(_) => doc! { "$nin": value },
                    _ => return Err(DocumentStoreError::InvalidQuery(
                        "NoneOf operator requires an array value".to_string(),
                    )),
                },
            }
        })
    }
}

/// Builds the projection document, if any.
pub(crate) fn projection_document(projection: Option<&Projection>) -> Option<Document> {
    let projection = projection?;
    let mut document = Document::new();

    match projection {
        Projection::Include { fields, id } => {
            for field in fields {
                document.insert(field.clone(), 1);
            }
            if !id {
                document.insert("_id", 0);
            }
        }
        Projection::Exclude(fields) => {
            for field in fields {
                document.insert(field.clone(), 0);
            }
        }
    }

    Some(document)
}

/// Builds the sort document, defaulting to ascending `_id`.
pub(crate) fn sort_document(criteria: &Criteria) -> Document {
    criteria
        .effective_sort()
        .into_iter()
        .map(|sort| {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            (sort.field, Bson::Int32(direction))
        })
        .collect()
}
