use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, Credential, FindOptions, IndexOptions},
};
use tracing::{info, warn};

use candystore_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder, UpdateResult},
    document::with_id,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Criteria, Expr},
    update::Update,
};

use crate::query::{MongoQueryTranslator, projection_document, sort_document};

const DUPLICATE_KEY: i32 = 11000;
const DUPLICATE_KEY_LEGACY: i32 = 11001;
const BAD_VALUE: i32 = 2;
const FAILED_TO_PARSE: i32 = 9;
const TYPE_MISMATCH: i32 = 14;
const DOLLAR_PREFIXED_FIELD_NAME: i32 = 52;
const EMPTY_FIELD_NAME: i32 = 56;
const DOTTED_FIELD_NAME: i32 = 57;
const IMMUTABLE_FIELD: i32 = 66;

/// The server's error code, when the server answered at all.
fn server_code(e: &MongoError) -> Option<i32> {
    match e.kind.as_ref() {
        ErrorKind::Command(err) => Some(err.code),
        ErrorKind::Write(WriteFailure::WriteError(err)) => Some(err.code),
        ErrorKind::InsertMany(err) => err.write_errors.as_ref()?.first().map(|w| w.code),
        _ => None,
    }
}

/// Classifies a driver error raised while operating on `namespace`.
///
/// Only server replies that blame the request become input errors. Connection, auth and
/// selection timeouts stay [`DocumentStoreError::Backend`].
fn backend_error(namespace: &Namespace) -> impl Fn(MongoError) -> DocumentStoreError + '_ {
    move |e| {
        let message = e.to_string();
        match server_code(&e) {
            Some(DUPLICATE_KEY | DUPLICATE_KEY_LEGACY) => {
                DocumentStoreError::DocumentAlreadyExists(message, namespace.collection.clone())
            }
            Some(IMMUTABLE_FIELD | DOLLAR_PREFIXED_FIELD_NAME | EMPTY_FIELD_NAME | DOTTED_FIELD_NAME) => {
                DocumentStoreError::InvalidUpdate(message)
            }
            Some(BAD_VALUE | FAILED_TO_PARSE | TYPE_MISMATCH) => DocumentStoreError::InvalidQuery(message),
            _ => DocumentStoreError::Backend(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
}

impl MongoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder() -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::default()
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }

    async fn update(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
        first_only: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        let collection = self.get_collection(namespace);
        let filter = MongoQueryTranslator::filter(filter)?;
        let modifications = update.clone().into_document();

        let result = if first_only {
            collection
                .update_one(filter, modifications)
                .upsert(upsert)
                .await
        } else {
            collection
                .update_many(filter, modifications)
                .upsert(upsert)
                .await
        };
        let result = result.map_err(backend_error(namespace))?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .list_database_names()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()> {
        self.client
            .database(database)
            .drop()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(database)
            .list_collection_names()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn create_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()> {
        self.client
            .database(&namespace.database)
            .create_collection(&namespace.collection)
            .await
            .map_err(backend_error(namespace))?;

        Ok(())
    }

    async fn drop_collection(&self, namespace: &Namespace) -> DocumentStoreResult<()> {
        self.get_collection(namespace)
            .drop()
            .await
            .map_err(backend_error(namespace))?;

        Ok(())
    }

    async fn create_index(&self, namespace: &Namespace, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.get_collection(namespace)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(IndexOptions::builder().unique(unique).build())
                    .build(),
            )
            .await
            .map_err(backend_error(namespace))?;

        Ok(())
    }

    async fn find(&self, namespace: &Namespace, criteria: &Criteria) -> DocumentStoreResult<Vec<Document>> {
        let mut options = FindOptions::default();
        options.sort = Some(sort_document(criteria));
        options.projection = projection_document(criteria.projection.as_ref());
        if criteria.skip > 0 {
            options.skip = Some(criteria.skip);
        }
        options.limit = criteria.limit().map(|limit| limit as i64);

        self.get_collection(namespace)
            .find(MongoQueryTranslator::filter(criteria.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(backend_error(namespace))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error(namespace))
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocumentStoreResult<Bson> {
        let (id, document) = with_id(document);

        self.get_collection(namespace)
            .insert_one(document)
            .await
            .map_err(backend_error(namespace))?;

        Ok(id)
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocumentStoreResult<Vec<Bson>> {
        let (ids, documents): (Vec<Bson>, Vec<Document>) = documents
            .into_iter()
            .map(with_id)
            .unzip();

        self.get_collection(namespace)
            .insert_many(documents)
            .await
            .map_err(backend_error(namespace))?;

        Ok(ids)
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        self.update(namespace, filter, update, upsert, true).await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Option<&Expr>,
        update: &Update,
        upsert: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        self.update(namespace, filter, update, upsert, false).await
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64> {
        Ok(self
            .get_collection(namespace)
            .delete_one(MongoQueryTranslator::filter(filter)?)
            .await
            .map_err(backend_error(namespace))?
            .deleted_count)
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Option<&Expr>) -> DocumentStoreResult<u64> {
        Ok(self
            .get_collection(namespace)
            .delete_many(MongoQueryTranslator::filter(filter)?)
            .await
            .map_err(backend_error(namespace))?
            .deleted_count)
    }

    async fn distinct(
        &self,
        namespace: &Namespace,
        field: &str,
        filter: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.get_collection(namespace)
            .distinct(field, MongoQueryTranslator::filter(filter)?)
            .await
            .map_err(backend_error(namespace))
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}

/// Builds a [`MongoDbStore`] from host, port and optional credentials, or from a full
/// connection URL.
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: Option<String>,
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
}

impl Default for MongoDbStoreBuilder {
    fn default() -> Self {
        Self {
            dsn: None,
            host: "localhost".to_string(),
            port: 27017,
            username: None,
            password: None,
            database: None,
        }
    }
}

impl MongoDbStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a full connection URL, ignoring host, port and credentials.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Database named in the URL path when credentials are used.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Returns the URL the client will connect to. Credentials are never part of it.
    pub fn connection_url(&self) -> String {
        match &self.dsn {
            Some(dsn) => dsn.clone(),
            None => format!(
                "mongodb://{}:{}/{}",
                self.host,
                self.port,
                self.database.as_deref().unwrap_or_default(),
            ),
        }
    }

    /// Parses the connection URL and attaches the configured credentials, authenticated
    /// against `admin`.
    pub async fn client_options(&self) -> DocumentStoreResult<ClientOptions> {
        let mut options = ClientOptions::parse(self.connection_url())
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if let (None, Some(username), Some(password)) = (&self.dsn, &self.username, &self.password) {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .source("admin".to_string())
                    .build(),
            );
        }

        Ok(options)
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Connects and pings the server. An unreachable server is logged, not fatal: the
    /// driver reconnects on the next operation.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let client = Client::with_options(self.client_options().await?)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        let store = MongoDbStore::new(client);
        match store.ping().await {
            Ok(()) => info!(host = %self.host, port = self.port, "connected to MongoDB"),
            Err(err) => warn!(error = %err, "MongoDB server unavailable"),
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_credentials() {
        let builder = MongoDbStore::builder().host("db").port(27018);

        assert_eq!(builder.connection_url(), "mongodb://db:27018/");
    }

    #[tokio::test]
    async fn credentials_with_reserved_characters_survive_parsing() {
        let builder = MongoDbStore::builder()
            .credentials("candy", "p@ss:w/rd")
            .database("candy_store");

        assert_eq!(builder.connection_url(), "mongodb://localhost:27017/candy_store");

        let credential = builder.client_options().await.unwrap().credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("candy"));
        assert_eq!(credential.password.as_deref(), Some("p@ss:w/rd"));
        assert_eq!(credential.source.as_deref(), Some("admin"));
    }

    #[test]
    fn explicit_dsn_wins() {
        let builder = MongoDbStore::builder()
            .host("ignored")
            .dsn("mongodb+srv://cluster.example.net/");

        assert_eq!(builder.connection_url(), "mongodb+srv://cluster.example.net/");
    }

    fn command_error(code: i32, code_name: &str) -> MongoError {
        let err = bson::deserialize_from_document(doc! {
            "code": code,
            "codeName": code_name,
            "errmsg": "rejected",
        })
        .unwrap();

        MongoError::from(ErrorKind::Command(err))
    }

    #[test]
    fn driver_errors_are_classified_by_server_code() {
        let namespace = Namespace::new("candy_store", "candies");
        let classify = backend_error(&namespace);

        assert!(matches!(
            classify(command_error(11000, "DuplicateKey")),
            DocumentStoreError::DocumentAlreadyExists(_, collection) if collection == "candies"
        ));
        assert!(matches!(
            classify(command_error(66, "ImmutableField")),
            DocumentStoreError::InvalidUpdate(_)
        ));
        assert!(matches!(
            classify(command_error(2, "BadValue")),
            DocumentStoreError::InvalidQuery(_)
        ));
        assert!(matches!(
            classify(command_error(13, "Unauthorized")),
            DocumentStoreError::Backend(_)
        ));
        assert!(matches!(
            classify(MongoError::from(std::io::Error::other("connection reset"))),
            DocumentStoreError::Backend(_)
        ));
    }
}
