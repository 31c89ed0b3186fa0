use bson::DateTime;
use candystore::{
    collection::CollectionRef,
    document::document_to_json,
    envelope::{Failure, Outcome},
    query::{Filter, Projection},
};
use serde_json::Value;
use tracing::{error, info};

use crate::{
    error::ApiError,
    models::{User, UserLogin, UserRegistration},
};

/// Registration and login over the `users` collection.
pub struct Accounts {
    users: CollectionRef,
    cost: u32,
}

impl Accounts {
    pub fn new(users: CollectionRef, cost: u32) -> Self {
        Self { users, cost }
    }

    pub async fn register(&self, registration: UserRegistration) -> Result<Outcome, ApiError> {
        if self.find_raw(&registration.email).await?.is_some() {
            return Ok(Outcome::failure(Failure::Duplicate)
                .message("Email already exists")
                .build());
        }

        let password = registration.password;
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::internal_server_error(e.to_string()))?
            .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

        let user = User {
            first: registration.first,
            last: registration.last,
            email: registration.email,
            password: hashed,
            created_at: DateTime::now(),
        };

        let outcome = self.users.insert_record(&user).await;
        match outcome.failure_kind() {
            None => {
                info!(email = %user.email, "registered user");
                Ok(Outcome::success().message("User registered successfully").build())
            }
            // Lost a race with a concurrent registration; the unique index caught it.
            Some(Failure::Duplicate) => Ok(Outcome::failure(Failure::Duplicate)
                .message("Email already exists")
                .build()),
            Some(_) => {
                error!(email = %user.email, message = ?outcome.message, "registration failed");
                Err(ApiError::from_outcome(&outcome))
            }
        }
    }

    pub async fn login(&self, login: UserLogin) -> Result<Outcome, ApiError> {
        let Some(document) = self.find_raw(&login.email).await? else {
            return Ok(Outcome::failure(Failure::NotFound)
                .message("User not found")
                .build());
        };
        // Only the hash is read; older documents may lack `created_at` or names.
        let hash = document
            .get_str("password")
            .map_err(|e| ApiError::internal_server_error(format!("stored user {} has no password hash: {e}", login.email)))?
            .to_string();

        let password = login.password;
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::internal_server_error(e.to_string()))?
            .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

        if verified {
            Ok(Outcome::success().message("Login successful").build())
        } else {
            Ok(Outcome::failure(Failure::InvalidInput)
                .message("Incorrect password")
                .build())
        }
    }

    /// Public profile of a user: name, email and creation time.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Value>, ApiError> {
        let projection = Projection::include(["first", "last", "email", "created_at"]).without_id();

        Ok(self
            .users
            .find_one(Some(Filter::eq("email", email)), Some(projection))
            .await?
            .map(document_to_json))
    }

    async fn find_raw(&self, email: &str) -> Result<Option<bson::Document>, ApiError> {
        Ok(self.users.find_one(Some(Filter::eq("email", email)), None).await?)
    }
}
