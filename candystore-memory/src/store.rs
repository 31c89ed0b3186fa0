//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that keeps documents as BSON in
//! per-collection vectors behind an async-safe read-write lock. It evaluates filters,
//! projections, sorts and update operators itself, so the HTTP layer can be exercised
//! without a database server.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;
use tracing::debug;

use candystore_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder, UpdateResult},
    document::{ID_FIELD, id_to_string, with_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Criteria, Expr, Projection, SortDirection},
    update::Update,
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Document>,
    unique_fields: Vec<String>,
}

type DatabaseMap = HashMap<String, CollectionData>;
type StoreMap = HashMap<String, DatabaseMap>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same data.
///
/// Finds scan every document in a collection. Unique indexes are honoured on insert
/// and update.
///
/// # Example
///
/// ```ignore
/// use candystore_memory::InMemoryStore;
/// use candystore_core::backend::{Namespace, StoreBackend};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let ns = Namespace::new("candy_store", "candies");
/// let id = store.insert_one(&ns, doc! { "name": "Nerds" }).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> collection name -> collection data
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

fn sort_documents(documents: &mut [&Document], criteria: &Criteria) {
    let keys = criteria.effective_sort();

    documents.sort_by(|a, b| {
        for key in &keys {
            let left = lookup(a, &key.field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);
            let right = lookup(b, &key.field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);

            let ordering = match key.direction {
                SortDirection::Asc => left.sort_cmp(&right),
                SortDirection::Desc => right.sort_cmp(&left),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

fn project(document: &Document, projection: Option<&Projection>) -> Document {
    match projection {
        None => document.clone(),
        Some(Projection::Include { fields, id }) => document
            .iter()
            .filter(|(key, _)| {
                if key.as_str() == ID_FIELD {
                    *id
                } else {
                    fields.iter().any(|f| f == *key)
                }
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Some(Projection::Exclude(fields)) => document
            .iter()
            .filter(|(key, _)| !fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> DocumentStoreResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set_path(inner, rest, value),
                _ => Err(DocumentStoreError::InvalidUpdate(format!(
                    "cannot set '{path}': '{head}' is not a document"
                ))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

/// Adds `by` to the value at `path`. Int32 sums that overflow widen to Int64; Int64
/// overflow is rejected.
fn increment(current: Option<&Bson>, by: &Bson, path: &str) -> DocumentStoreResult<Bson> {
    let invalid = || DocumentStoreError::InvalidUpdate(format!("cannot increment non-numeric field '{path}'"));
    let overflow = || DocumentStoreError::InvalidUpdate(format!("incrementing '{path}' would overflow"));

    let widened = |a: i64, b: i64| a.checked_add(b).map(Bson::Int64).ok_or_else(overflow);

    match (current, by) {
        (_, by) if as_f64(by).is_none() => Err(invalid()),
        (None, by) => Ok(by.clone()),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(i64::from(*a) + i64::from(*b)),
        }),
        (Some(Bson::Int64(a)), Bson::Int32(b)) => widened(*a, i64::from(*b)),
        (Some(Bson::Int32(a)), Bson::Int64(b)) => widened(i64::from(*a), *b),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => widened(*a, *b),
        (Some(current), by) => {
            let a = as_f64(current).ok_or_else(invalid)?;
            let b = as_f64(by).ok_or_else(invalid)?;
            Ok(Bson::Double(a + b))
        }
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Applies an update to `document` in place, returning whether anything changed.
fn apply_update(document: &mut Document, update: &Update) -> DocumentStoreResult<bool> {
    let before = document.clone();

    match update {
        Update::Set(fields) => {
            for (path, value) in fields {
                set_path(document, path, value.clone())?;
            }
        }
        Update::Operators(operators) => {
            for (operator, arguments) in operators {
                let arguments = arguments.as_document().ok_or_else(|| {
                    DocumentStoreError::InvalidUpdate(format!("{operator} expects a document"))
                })?;

                for (path, value) in arguments {
                    match operator.as_str() {
                        "$set" => set_path(document, path, value.clone())?,
                        "$unset" => unset_path(document, path),
                        "$inc" => {
                            let next = increment(lookup(document, path), value, path)?;
                            set_path(document, path, next)?;
                        }
                        other => {
                            return Err(DocumentStoreError::InvalidUpdate(format!(
                                "unsupported update operator {other}"
                            )));
                        }
                    }
                }
            }
        }
    }

    if document.get(ID_FIELD) != before.get(ID_FIELD) {
        return Err(DocumentStoreError::InvalidUpdate("the _id field is immutable".into()));
    }

    Ok(*document != before)
}

impl CollectionData {
    /// Fails if `candidate` (at `position`, or new when `None`) would duplicate `_id` or a
    /// uniquely indexed field.
    fn check_unique(
        &self,
        candidate: &Document,
        position: Option<usize>,
        namespace: &Namespace,
    ) -> DocumentStoreResult<()> {
        let fields = std::iter::once(ID_FIELD).chain(self.unique_fields.iter().map(String::as_str));

        for field in fields {
            let Some(value) = lookup(candidate, field) else {
                continue;
            };
            let value = Comparable::from(value);

            let clash = self
                .documents
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != position)
                .any(|(_, other)| lookup(other, field).is_some_and(|v| Comparable::from(v) == value));

            if clash {
                let shown = lookup(candidate, field)
                    .map(id_to_string)
                    .unwrap_or_default();
                return Err(DocumentStoreError::DocumentAlreadyExists(
                    format!("{field}={shown}"),
                    namespace.collection.clone(),
                ));
            }
        }

        Ok(())
    }

    fn insert(&mut self, document: Document, namespace: &Namespace) -> DocumentStoreResult<Bson> {
        let (id, document) = with_id(document);
        self.check_unique(&document, None, namespace)?;
        self.documents.push(document);

        Ok(id)
    }

    fn matching_positions(&self, filter: Option<&Expr>) -> DocumentStoreResult<Vec<usize>> {
        let mut positions = Vec::new();

        for (index, document) in self.documents.iter().enumerate() {
            let keep = match filter {
                Some(expr) => DocumentEvaluator::new(document).evaluate(expr)?,
                None => true,
            };

            if keep {
                positions.push(index);
            }
        }

        Ok(positions)
    }

    fn update(
        &mut self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
        first_only: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        let mut positions = self.matching_positions(filter)?;
        if first_only {
            positions.truncate(1);
        }

        if positions.is_empty() {
            if !upsert {
                return Ok(UpdateResult::default());
            }

            let mut seed = Document::new();
            if let Some(expr) = filter {
                for (field, value) in expr.equality_terms() {
                    set_path(&mut seed, field, value.clone())?;
                }
            }
            apply_update(&mut seed, update)?;
            let id = self.insert(seed, namespace)?;

            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                upserted_id: Some(id),
            });
        }

        let mut result = UpdateResult {
            matched_count: positions.len() as u64,
            ..UpdateResult::default()
        };

        for position in positions {
            let mut candidate = self.documents[position].clone();
            if apply_update(&mut candidate, update)? {
                self.check_unique(&candidate, Some(position), namespace)?;
                self.documents[position] = candidate;
                result.modified_count += 1;
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self.store.read().await.keys().cloned().collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(database);

        Ok(())
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        let mut names = self
            .store
            .read()
            .await
            .get(database)
            .map(|db| db.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        names.sort();

        Ok(names)
    }

    async fn create_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()> {
        if let Some(db) = self.store.write().await.get_mut(&namespace.database) {
            db.remove(&namespace.collection);
        }

        Ok(())
    }

    async fn create_index(&self, namespace: &Namespace, field: &str, unique: bool) -> DocumentStoreResult<()> {
        if !unique {
            // Finds scan everything, so only uniqueness matters here.
            return Ok(());
        }

        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        if collection.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let mut seen: Vec<Comparable<'_>> = Vec::new();
        for value in collection.documents.iter().filter_map(|d| lookup(d, field)) {
            let value = Comparable::from(value);
            if seen.contains(&value) {
                return Err(DocumentStoreError::Backend(format!(
                    "cannot create unique index on {namespace}.{field}: duplicate values exist"
                )));
            }
            seen.push(value);
        }
        drop(seen);

        collection.unique_fields.push(field.to_string());
        debug!(%namespace, field, "created unique index");

        Ok(())
    }

    async fn find(&self, namespace: &Namespace, criteria: &Criteria) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let collection = match store
            .get(&namespace.database)
            .and_then(|db| db.get(&namespace.collection))
        {
            Some(collection) => collection,
            None => return Ok(vec![]),
        };

        let mut matched = DocumentEvaluator::filter_documents(&collection.documents, criteria.filter.as_ref())?;
        sort_documents(&mut matched, criteria);

        Ok(matched
            .into_iter()
            .skip(criteria.skip as usize)
            .take(criteria.limit().map(|l| l as usize).unwrap_or(usize::MAX))
            .map(|document| project(document, criteria.projection.as_ref()))
            .collect())
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocumentStoreResult<Bson> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        collection.insert(document, namespace)
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocumentStoreResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        // Ordered insert: stop at the first failure, keeping what was written before it.
        documents
            .into_iter()
            .map(|document| collection.insert(document, namespace))
            .collect()
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        collection.update(namespace, filter, update, upsert, true)
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        collection.update(namespace, filter, update, upsert, false)
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection) = store
            .get_mut(&namespace.database)
            .and_then(|db| db.get_mut(&namespace.collection))
        else {
            return Ok(0);
        };

        match collection.matching_positions(filter)?.first() {
            Some(&position) => {
                collection.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection) = store
            .get_mut(&namespace.database)
            .and_then(|db| db.get_mut(&namespace.collection))
        else {
            return Ok(0);
        };

        let positions = collection.matching_positions(filter)?;
        for position in positions.iter().rev() {
            collection.documents.remove(*position);
        }

        Ok(positions.len() as u64)
    }

    async fn distinct(
        &self,
        namespace: &Namespace,
        field: &str,
        filter: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection) = store
            .get(&namespace.database)
            .and_then(|db| db.get(&namespace.collection))
        else {
            return Ok(vec![]);
        };

        let mut values: Vec<Bson> = Vec::new();
        for document in DocumentEvaluator::filter_documents(&collection.documents, filter)? {
            let candidates = match lookup(document, field) {
                Some(Bson::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };

            for candidate in candidates {
                if !values.iter().any(|v| Comparable::from(v) == Comparable::from(&candidate)) {
                    values.push(candidate);
                }
            }
        }

        values.sort_by(|a, b| Comparable::from(a).sort_cmp(&Comparable::from(b)));

        Ok(values)
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use candystore_memory::InMemoryStore;
/// use candystore_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await.unwrap();
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new, empty [`InMemoryStore`]. This always succeeds.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use candystore_core::query::Filter;

    fn candies() -> Namespace {
        Namespace::new("candy_store", "candies")
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_many(
                &candies(),
                vec![
                    doc! { "name": "Nerds", "category": "Sour", "price": 2.5 },
                    doc! { "name": "Gobstopper", "category": "Hard", "price": 1.0 },
                    doc! { "name": "Warheads", "category": "Sour", "price": 0.75 },
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn insert_generates_object_ids_and_rejects_duplicates() {
        let store = InMemoryStore::new();

        let id = store.insert_one(&candies(), doc! { "name": "Nerds" }).await.unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        let err = store
            .insert_one(&candies(), doc! { "_id": id.clone(), "name": "Again" })
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(..)));
    }

    #[tokio::test]
    async fn find_sorts_skips_limits_and_projects() {
        let store = seeded().await;
        let criteria = Criteria::builder()
            .filter(Filter::eq("category", "Sour"))
            .projection(Projection::include(["name"]).without_id())
            .sort("price", SortDirection::Desc)
            .build();

        let found = store.find(&candies(), &criteria).await.unwrap();
        assert_eq!(found, vec![doc! { "name": "Nerds" }, doc! { "name": "Warheads" }]);

        let page = Criteria::builder()
            .sort("price", SortDirection::Asc)
            .skip(1)
            .limit(1)
            .build();
        let found = store.find(&candies(), &page).await.unwrap();
        assert_eq!(found[0].get_str("name").unwrap(), "Gobstopper");
    }

    #[tokio::test]
    async fn multiple_sort_keys_break_ties_in_order() {
        let store = seeded().await;
        let criteria = Criteria::builder()
            .sort("category", SortDirection::Asc)
            .sort("price", SortDirection::Asc)
            .build();

        let names = store
            .find(&candies(), &criteria)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.get_str("name").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Gobstopper", "Warheads", "Nerds"]);
    }

    #[tokio::test]
    async fn missing_namespaces_read_as_empty() {
        let store = InMemoryStore::new();
        let ns = Namespace::new("nowhere", "nothing");

        assert!(store.find(&ns, &Criteria::all()).await.unwrap().is_empty());
        assert_eq!(store.delete_many(&ns, None).await.unwrap(), 0);
        assert!(store.list_collections("nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_many_applies_operators_to_every_match() {
        let store = seeded().await;
        let update = Update::from_payload(doc! { "$inc": { "price": 1 }, "$set": { "on_sale": true } }).unwrap();

        let result = store
            .update_many(&candies(), Some(&Filter::eq("category", "Sour")), &update, false)
            .await
            .unwrap();
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.modified_count, 2);

        let nerds = store
            .find(&candies(), &Criteria::builder().filter(Filter::eq("name", "Nerds")).build())
            .await
            .unwrap();
        assert_eq!(nerds[0].get_f64("price").unwrap(), 3.5);
        assert!(nerds[0].get_bool("on_sale").unwrap());
    }

    #[tokio::test]
    async fn upsert_seeds_new_document_from_filter() {
        let store = InMemoryStore::new();
        let ns = Namespace::new("candy_store", "locations");
        let update = Update::set("latitude", 33.9);

        let result = store
            .update_one(&ns, Some(&Filter::eq("email", "a@b.c")), &update, true)
            .await
            .unwrap();
        assert_eq!(result.matched_count, 0);
        assert!(result.upserted_id.is_some());

        let stored = store.find(&ns, &Criteria::all()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get_str("email").unwrap(), "a@b.c");
        assert_eq!(stored[0].get_f64("latitude").unwrap(), 33.9);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_values() {
        let store = InMemoryStore::new();
        let ns = Namespace::new("candy_store", "users");
        store.create_index(&ns, "email", true).await.unwrap();

        store.insert_one(&ns, doc! { "email": "a@b.c" }).await.unwrap();
        let err = store.insert_one(&ns, doc! { "email": "a@b.c" }).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(..)));
    }

    #[tokio::test]
    async fn delete_one_removes_a_single_match() {
        let store = seeded().await;

        let removed = store
            .delete_one(&candies(), Some(&Filter::eq("category", "Sour")))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let removed = store
            .delete_many(&candies(), Some(&Filter::eq("category", "Sour")))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.find(&candies(), &Criteria::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn distinct_flattens_arrays_and_sorts() {
        let store = seeded().await;

        let categories = store.distinct(&candies(), "category", None).await.unwrap();
        assert_eq!(categories, vec![Bson::from("Hard"), Bson::from("Sour")]);
    }

    #[test]
    fn increments_widen_int32_and_reject_int64_overflow() {
        assert_eq!(
            increment(Some(&Bson::Int32(i32::MAX)), &Bson::Int32(1), "n").unwrap(),
            Bson::Int64(i64::from(i32::MAX) + 1)
        );
        assert_eq!(increment(Some(&Bson::Int32(2)), &Bson::Int64(3), "n").unwrap(), Bson::Int64(5));
        assert_eq!(increment(None, &Bson::Int32(4), "n").unwrap(), Bson::Int32(4));

        for (current, by) in [(Bson::Int64(i64::MAX), Bson::Int32(1)), (Bson::Int64(i64::MIN), Bson::Int64(-1))] {
            let err = increment(Some(&current), &by, "n").unwrap_err();
            assert!(matches!(err, DocumentStoreError::InvalidUpdate(_)));
        }
        assert!(increment(None, &Bson::from("one"), "n").is_err());
    }

    #[tokio::test]
    async fn overflowing_increment_leaves_document_unchanged() {
        let store = InMemoryStore::new();
        store
            .insert_one(&candies(), doc! { "name": "Jawbreaker", "quantity": i64::MAX })
            .await
            .unwrap();
        let update = Update::from_payload(doc! { "$inc": { "quantity": 1 } }).unwrap();

        let err = store
            .update_one(&candies(), Some(&Filter::eq("name", "Jawbreaker")), &update, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidUpdate(_)));

        let stored = store.find(&candies(), &Criteria::all()).await.unwrap();
        assert_eq!(stored[0].get_i64("quantity").unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn update_cannot_change_identifier() {
        let store = seeded().await;
        let update = Update::set("_id", ObjectId::new());

        let err = store
            .update_one(&candies(), Some(&Filter::eq("name", "Nerds")), &update, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidUpdate(_)));
    }

    #[tokio::test]
    async fn collections_are_created_and_dropped_per_database() {
        let store = InMemoryStore::new();
        store.create_collection(&candies()).await.unwrap();
        store.create_collection(&Namespace::new("candy_store", "users")).await.unwrap();

        assert_eq!(store.list_collections("candy_store").await.unwrap(), vec!["candies", "users"]);

        store.drop_collection(&candies()).await.unwrap();
        assert_eq!(store.list_collections("candy_store").await.unwrap(), vec!["users"]);

        store.drop_database("candy_store").await.unwrap();
        assert!(store.list_databases().await.unwrap().is_empty());
    }
}
