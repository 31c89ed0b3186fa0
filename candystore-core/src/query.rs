//! Query criteria and filtering API for document stores.
//!
//! A [`Criteria`] bundles everything a find needs: filter predicate, projection, sort
//! order, skip and limit. Backends translate it through the [`QueryVisitor`] trait.
//!
//! # Building criteria
//!
//! ```ignore
//! use candystore_core::query::{Criteria, Filter, Projection, SortDirection};
//!
//! let criteria = Criteria::builder()
//!     .filter(Filter::gte("price", 1.0).and(Filter::lte("price", 5.0)))
//!     .projection(Projection::include(["name", "price"]).without_id())
//!     .sort("price", SortDirection::Desc)
//!     .skip(10)
//!     .limit(10)
//!     .build();
//! ```
//!
//! [`Filter`] has one constructor per [`FieldOp`], plus `exists`/`not_exists`,
//! `and`/`or` over several terms, and `id` for `_id` lookups.

use bson::Bson;

use crate::{
    document::{ID_FIELD, coerce_id},
    error::DocumentStoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key. Several keys are applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }
}

/// Comparison applied by an [`Expr::Field`] term.
///
/// `Contains`, `StartsWith` and `EndsWith` compare strings case-insensitively.
/// `Contains` and `NotContains` also accept array fields, where they test membership.
/// `AnyOf` and `NoneOf` take an array operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    AnyOf,
    NoneOf,
}

/// A filter predicate over stored documents. Field names may use dotted paths.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `true` matches documents that have the field, `false` those that lack it.
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// `self AND other`, flattening into an existing conjunction.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut terms) => {
                terms.push(other);
                Expr::And(terms)
            }
            single => Expr::And(vec![single, other]),
        }
    }

    /// `self OR other`, flattening into an existing disjunction.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut terms) => {
                terms.push(other);
                Expr::Or(terms)
            }
            single => Expr::Or(vec![single, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Collects the `field == value` pairs this expression pins down.
    ///
    /// Only top-level equality terms and equality terms inside a top-level AND are
    /// returned. Used to seed the document created by an upsert.
    pub fn equality_terms(&self) -> Vec<(&str, &Bson)> {
        match self {
            Expr::Field { field, op: FieldOp::Eq, value } => vec![(field.as_str(), value)],
            Expr::And(exprs) => exprs
                .iter()
                .flat_map(|expr| match expr {
                    Expr::Field { field, op: FieldOp::Eq, value } => Some((field.as_str(), value)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Which fields a find returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Return only the listed fields. `_id` is returned as well unless `id` is false.
    Include { fields: Vec<String>, id: bool },
    /// Return every field except the listed ones.
    Exclude(Vec<String>),
}

impl Projection {
    /// Projects onto the given fields, keeping `_id`.
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include {
            fields: fields.into_iter().map(Into::into).collect(),
            id: true,
        }
    }

    /// Removes the given fields from every result.
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Drops `_id` from the projection.
    pub fn without_id(self) -> Self {
        match self {
            Projection::Include { fields, .. } => Projection::Include { fields, id: false },
            Projection::Exclude(mut fields) => {
                if !fields.iter().any(|f| f == ID_FIELD) {
                    fields.push(ID_FIELD.to_string());
                }
                Projection::Exclude(fields)
            }
        }
    }
}

/// The full description of a find: filter, projection, sort, skip and limit.
///
/// Defaults match every document, return all fields, sort ascending by `_id`,
/// skip nothing and apply no limit (`limit == 0`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    /// `None` matches every document.
    pub filter: Option<Expr>,
    /// Optional projection; `None` returns every field.
    pub projection: Option<Projection>,
    /// Sort keys applied in order. Empty means ascending by `_id`.
    pub sort: Vec<Sort>,
    /// Number of documents to skip.
    pub skip: u64,
    /// Maximum number of documents to return, `0` for no limit.
    pub limit: u64,
}

impl Criteria {
    /// Criteria matching every document with default ordering.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a new criteria builder for fluent construction.
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::new()
    }

    /// Returns the sort keys to apply, falling back to ascending `_id`.
    pub fn effective_sort(&self) -> Vec<Sort> {
        if self.sort.is_empty() {
            vec![Sort::new(ID_FIELD, SortDirection::Asc)]
        } else {
            self.sort.clone()
        }
    }

    /// Returns the limit as an option, mapping `0` to "unlimited".
    pub fn limit(&self) -> Option<u64> {
        (self.limit > 0).then_some(self.limit)
    }
}

fn term(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Expr {
    Expr::field(field.into(), op, value.into())
}

/// Shorthand constructors for [`Expr`].
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Eq, value)
    }

    /// Matches documents whose `_id` equals `id`, coercing ObjectId hex strings.
    pub fn id(id: &str) -> Expr {
        term(ID_FIELD, FieldOp::Eq, coerce_id(id))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Lte, value)
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<Bson>) -> Expr {
        term(field, FieldOp::StartsWith, prefix)
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<Bson>) -> Expr {
        term(field, FieldOp::EndsWith, suffix)
    }

    /// Substring match on strings, membership on arrays.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::Contains, value)
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        term(field, FieldOp::NotContains, value)
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(terms: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(terms.into_iter().collect())
    }

    pub fn or(terms: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(terms.into_iter().collect())
    }

    /// `values` must be an array.
    pub fn any_of(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        term(field, FieldOp::AnyOf, values)
    }

    /// `values` must be an array.
    pub fn none_of(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        term(field, FieldOp::NoneOf, values)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        CriteriaBuilder { criteria: Criteria::default() }
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.criteria.filter = Some(filter);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.criteria.projection = Some(projection);
        self
    }

    /// Appends a sort key. Keys are applied in the order they are added.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.criteria.sort.push(Sort::new(field, direction));
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.criteria.skip = skip;
        self
    }

    /// Sets the maximum number of documents to return (`0` for no limit).
    pub fn limit(mut self, limit: u64) -> Self {
        self.criteria.limit = limit;
        self
    }

    pub fn build(self) -> Criteria {
        self.criteria
    }
}

/// Walks an [`Expr`] tree. Backends implement this to translate filters into their own
/// query language or to evaluate them directly.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, present: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, op: &FieldOp, operand: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, present) => self.visit_exists(field, *present),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn default_criteria_sorts_by_id_without_limit() {
        let criteria = Criteria::all();

        assert_eq!(criteria.effective_sort(), vec![Sort::new("_id", SortDirection::Asc)]);
        assert_eq!(criteria.limit(), None);
        assert_eq!(criteria.skip, 0);
        assert!(criteria.filter.is_none());
    }

    #[test]
    fn builder_keeps_sort_keys_in_order() {
        let criteria = Criteria::builder()
            .sort("category", SortDirection::Asc)
            .sort("price", SortDirection::Desc)
            .limit(3)
            .build();

        assert_eq!(
            criteria.effective_sort(),
            vec![
                Sort::new("category", SortDirection::Asc),
                Sort::new("price", SortDirection::Desc),
            ]
        );
        assert_eq!(criteria.limit(), Some(3));
    }

    #[test]
    fn and_flattens_into_one_list() {
        let expr = Filter::gte("price", 1.0)
            .and(Filter::lte("price", 2.0))
            .and(Filter::eq("category", "Sour"));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn id_filter_coerces_object_ids() {
        let oid = ObjectId::new();

        assert_eq!(Filter::id(&oid.to_hex()), Filter::eq("_id", oid));
        assert_eq!(Filter::id("img-7"), Filter::eq("_id", "img-7"));
    }

    #[test]
    fn equality_terms_only_reads_top_level_equalities() {
        let expr = Filter::eq("email", "a@b.c")
            .and(Filter::gt("latitude", 0.0))
            .and(Filter::eq("kind", "home"));

        let terms = expr.equality_terms();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].0, "email");
        assert_eq!(terms[1].0, "kind");
    }

    #[test]
    fn without_id_excludes_identifier_once() {
        let projection = Projection::exclude(["password", "_id"]).without_id();

        assert_eq!(projection, Projection::exclude(["password", "_id"]));
        assert_eq!(
            Projection::include(["name"]).without_id(),
            Projection::Include { fields: vec!["name".into()], id: false }
        );
    }
}
