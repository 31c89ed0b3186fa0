use bson::{doc, oid::ObjectId};
use candystore_core::{
    envelope::Failure,
    query::{Criteria, Filter, Projection, SortDirection},
    store::DocumentStore,
};
use candystore_memory::InMemoryStore;
use serde_json::json;

fn store() -> DocumentStore {
    DocumentStore::new(InMemoryStore::new())
}

#[tokio::test]
async fn get_with_zero_matches_is_an_empty_success() {
    let candies = store().database("candy_store").collection("candies");

    let envelope = candies
        .get(Criteria::builder().filter(Filter::eq("category", "None")).build())
        .await;

    assert!(envelope.success);
    assert_eq!(envelope.result_size, 0);
    assert!(envelope.data.is_empty());
}

#[tokio::test]
async fn inserted_document_is_returned_once_with_string_id() {
    let candies = store().database("candy_store").collection("candies");

    let outcome = candies
        .insert(doc! { "name": "Nerds", "category": "Sour", "price": 2.5 })
        .await;
    assert!(outcome.success);
    let ids = outcome.inserted_ids.unwrap();
    assert_eq!(ids.len(), 1);

    let envelope = candies
        .get(Criteria::builder().filter(Filter::eq("name", "Nerds")).build())
        .await;
    assert_eq!(envelope.result_size, 1);
    assert_eq!(envelope.data[0]["_id"], json!(ids[0]));
    assert!(ObjectId::parse_str(&ids[0]).is_ok());
}

#[tokio::test]
async fn empty_batch_insert_is_a_no_op() {
    let candies = store().database("candy_store").collection("candies");

    let outcome = candies.insert(Vec::<bson::Document>::new()).await;

    assert!(outcome.success);
    assert_eq!(outcome.inserted_ids, Some(vec![]));
}

#[tokio::test]
async fn malformed_filter_yields_failed_envelope() {
    let candies = store().database("candy_store").collection("candies");
    candies.insert(doc! { "name": "Nerds" }).await;

    let envelope = candies
        .get(Criteria::builder().filter(Filter::contains("name", 7)).build())
        .await;

    assert!(!envelope.success);
    assert!(envelope.error.is_some());
}

#[tokio::test]
async fn update_wraps_plain_payload_and_touches_every_match() {
    let candies = store().database("candy_store").collection("candies");
    candies
        .insert(vec![
            doc! { "name": "Nerds", "category": "Sour" },
            doc! { "name": "Warheads", "category": "Sour" },
        ])
        .await;

    let outcome = candies
        .update(Some(Filter::eq("category", "Sour")), doc! { "featured": true }, false)
        .await;
    assert_eq!(outcome.matched_count, Some(2));
    assert_eq!(outcome.modified_count, Some(2));

    let mixed = candies
        .update(None, doc! { "$set": { "a": 1 }, "b": 2 }, false)
        .await;
    assert!(!mixed.success);
    assert_eq!(mixed.failure_kind(), Some(Failure::InvalidInput));
}

#[tokio::test]
async fn put_field_on_missing_id_leaves_store_unchanged() {
    let candies = store().database("candy_store").collection("candies");
    candies.insert(doc! { "id": "1", "name": "Nerds", "price": 2.5 }).await;

    let outcome = candies.put_field("id", "999", "price", 9.0).await;
    assert!(!outcome.success);
    assert_eq!(outcome.matched_count, Some(0));
    assert_eq!(outcome.message.as_deref(), Some("No matching document found."));

    let envelope = candies.get(Criteria::all()).await;
    assert_eq!(envelope.data[0]["price"], json!(2.5));

    let outcome = candies.put_field("id", "1", "price", 3.0).await;
    assert!(outcome.success);
    assert_eq!(outcome.modified_count, Some(1));
}

#[tokio::test]
async fn put_field_coerces_object_id_strings() {
    let candies = store().database("candy_store").collection("candies");
    let ids = candies
        .insert(doc! { "name": "Nerds" })
        .await
        .inserted_ids
        .unwrap();

    let outcome = candies.put_field("_id", &ids[0], "name", "Nerds Rope").await;

    assert!(outcome.success);
    assert_eq!(outcome.matched_count, Some(1));
}

#[tokio::test]
async fn delete_one_and_delete_many_are_distinct() {
    let candies = store().database("candy_store").collection("candies");
    candies
        .insert(vec![
            doc! { "name": "A", "category": "Sour" },
            doc! { "name": "B", "category": "Sour" },
            doc! { "name": "C", "category": "Sour" },
        ])
        .await;

    let one = candies.delete_one(Some(Filter::eq("category", "Sour"))).await;
    assert!(one.success);
    assert_eq!(one.message.as_deref(), Some("Document deleted successfully."));
    assert_eq!(candies.get(Criteria::all()).await.result_size, 2);

    let many = candies.delete_many(Some(Filter::eq("category", "Sour"))).await;
    assert_eq!(many.deleted_count, Some(2));
    assert_eq!(candies.get(Criteria::all()).await.result_size, 0);

    let none = candies.delete_many(Some(Filter::eq("category", "Sour"))).await;
    assert!(none.success);
    assert_eq!(none.deleted_count, Some(0));
}

#[tokio::test]
async fn delete_by_id_validates_format() {
    let candies = store().database("candy_store").collection("candies");

    let invalid = candies.delete_by_id("not-an-id").await;
    assert_eq!(invalid.message.as_deref(), Some("Invalid ObjectId format."));
    assert_eq!(invalid.failure_kind(), Some(Failure::InvalidIdentifier));

    let missing = candies.delete_by_id(&ObjectId::new().to_hex()).await;
    assert_eq!(missing.message.as_deref(), Some("Document not found."));
    assert_eq!(missing.failure_kind(), Some(Failure::NotFound));
}

#[tokio::test]
async fn ensure_collection_creates_only_once() {
    let db = store().database("candy_store");

    assert!(db.ensure_collection("candies").await.unwrap());
    assert!(!db.ensure_collection("candies").await.unwrap());
    assert_eq!(db.list_collections().await.unwrap(), vec!["candies".to_string()]);
}

#[tokio::test]
async fn find_one_honours_projection_and_order() {
    let candies = store().database("candy_store").collection("candies");
    candies
        .insert(vec![doc! { "name": "A", "secret": 1 }, doc! { "name": "B", "secret": 2 }])
        .await;

    let first = candies
        .find_one(None, Some(Projection::exclude(["secret"]).without_id()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, doc! { "name": "A" });

    let sorted = candies
        .get(Criteria::builder().sort("name", SortDirection::Desc).build())
        .await;
    assert_eq!(sorted.data[0]["name"], json!("B"));
}
