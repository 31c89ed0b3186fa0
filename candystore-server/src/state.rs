use anyhow::Result;
use candystore::{
    backend::StoreBackendBuilder,
    collection::CollectionRef,
    document::Record,
    error::DocumentStoreResult,
    memory::InMemoryStore,
    mongodb::MongoDbStore,
    store::{DatabaseRef, DocumentStore},
};
use tracing::info;

use crate::{
    accounts::Accounts,
    config::{BackendKind, Config},
    images::ImageStore,
    locations::Locations,
    models::{Candy, Category, IMAGES, Location, User},
};

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub db: DatabaseRef,
    pub config: Config,
}

impl AppState {
    pub fn new(store: DocumentStore, config: Config) -> Self {
        let db = store.database(config.database_name.clone());
        Self { store, db, config }
    }

    /// Connects to the backend named in `config`.
    pub async fn connect(config: Config) -> Result<Self> {
        let store = match config.store_backend {
            BackendKind::Memory => {
                info!("using in-memory document store");
                DocumentStore::new(InMemoryStore::new())
            }
            BackendKind::MongoDb => {
                let mut builder = MongoDbStore::builder()
                    .host(config.mongo_host.clone())
                    .port(config.mongo_port)
                    .database(config.database_name.clone());
                if let (Some(username), Some(password)) = (&config.mongo_username, &config.mongo_password) {
                    builder = builder.credentials(username.clone(), password.clone());
                }
                if let Some(url) = &config.mongo_url {
                    builder = builder.dsn(url.clone());
                }
                DocumentStore::new(builder.build().await?)
            }
        };

        Ok(Self::new(store, config))
    }

    /// Creates the catalog's collections and the unique email index.
    pub async fn prepare(&self) -> DocumentStoreResult<()> {
        for name in [
            Candy::collection_name(),
            Category::collection_name(),
            User::collection_name(),
            Location::collection_name(),
            IMAGES,
        ] {
            self.db.ensure_collection(name).await?;
        }
        self.db.ensure_unique_index(User::collection_name(), "email").await?;
        self.db.ensure_unique_index(Location::collection_name(), "email").await
    }

    pub fn candies(&self) -> CollectionRef {
        self.db.typed::<Candy>()
    }

    pub fn categories(&self) -> CollectionRef {
        self.db.typed::<Category>()
    }

    pub fn users(&self) -> CollectionRef {
        self.db.typed::<User>()
    }

    pub fn accounts(&self) -> Accounts {
        Accounts::new(self.users(), self.config.bcrypt_cost)
    }

    pub fn locations(&self) -> Locations {
        Locations::new(self.db.typed::<Location>())
    }

    pub fn images(&self) -> ImageStore {
        ImageStore::new(self.db.collection(IMAGES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candystore::{envelope::Failure, query::Filter};
    use bson::doc;

    fn memory_state() -> AppState {
        let config = Config {
            store_backend: BackendKind::Memory,
            ..Config::default()
        };
        AppState::new(DocumentStore::new(InMemoryStore::new()), config)
    }

    #[tokio::test]
    async fn prepare_creates_collections_and_is_idempotent() {
        let state = memory_state();

        state.prepare().await.unwrap();
        state.prepare().await.unwrap();

        let collections = state.db.list_collections().await.unwrap();
        assert_eq!(
            collections,
            vec!["candies", "categories", "images", "locations", "users"]
        );
    }

    #[tokio::test]
    async fn user_emails_are_unique_after_prepare() {
        let state = memory_state();
        state.prepare().await.unwrap();

        state.users().insert(doc! { "email": "a@example.com" }).await;
        let second = state.users().insert(doc! { "email": "a@example.com" }).await;

        assert_eq!(second.failure_kind(), Some(Failure::Duplicate));
        let stored = state
            .users()
            .find(&candystore::query::Criteria::builder().filter(Filter::eq("email", "a@example.com")).build())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }
}
