use bson::DateTime;
use candystore::document::Record;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Collection holding uploaded image blobs.
pub const IMAGES: &str = "images";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candy {
    /// Catalog identifier, distinct from the store's `_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub image_url: String,
}

impl Record for Candy {
    fn collection_name() -> &'static str {
        "candies"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub count: i64,
}

impl Record for Category {
    fn collection_name() -> &'static str {
        "categories"
    }
}

/// A stored account. `password` holds the bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub first: String,
    pub last: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime,
}

impl Record for User {
    fn collection_name() -> &'static str {
        "users"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegistration {
    pub first: String,
    pub last: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

/// A location report. The timestamp defaults to the time the report is received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationReport {
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<Utc>>,
}

/// The last known position of a user, one per email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime,
}

impl Record for Location {
    fn collection_name() -> &'static str {
        "locations"
    }
}

/// Body of `PATCH /candies/id/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRange {
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadiusQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}
