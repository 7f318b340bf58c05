//! Process-wide document-store handle.
//!
//! The cache is owned by the application state and built once in `main`. The
//! first caller connects; concurrent first callers wait on the same attempt.
//! Secondary indexes are created once per process, guarded by a flag.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::try_join_all;
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::model::{project::PROJECTS_COLLECTION, token::TOKENS_COLLECTION, user::USERS_COLLECTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec
{
    pub keys: &'static [(&'static str, i32)],
    pub unique: bool,
    pub expire_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionIndexes
{
    pub collection: &'static str,
    pub indexes: &'static [IndexSpec],
}

pub const INDEXES: &[CollectionIndexes] = &[
    CollectionIndexes
    {
        collection: TOKENS_COLLECTION,
        indexes: &[IndexSpec { keys: &[("expireAt", -1)], unique: false, expire_after: Some(Duration::ZERO) }],
    },
    CollectionIndexes
    {
        collection: PROJECTS_COLLECTION,
        indexes: &[
            IndexSpec { keys: &[("createdAt", -1)], unique: false, expire_after: None },
            IndexSpec { keys: &[("creatorId", -1)], unique: false, expire_after: None },
        ],
    },
    CollectionIndexes
    {
        collection: USERS_COLLECTION,
        indexes: &[
            IndexSpec { keys: &[("email", 1)], unique: true, expire_after: None },
            IndexSpec { keys: &[("username", 1)], unique: true, expire_after: None },
        ],
    },
];

/// Whatever can open a store connection and build indexes on it.
pub trait DocumentBackend: Send + Sync + 'static
{
    type Client: Clone + Send + Sync + 'static;
    type Database: Send;

    fn connect(&self, uri: &str) -> impl Future<Output = Result<Self::Client, AppError>> + Send;

    fn create_indexes(
        &self,
        client: &Self::Client,
        collection: &'static str,
        indexes: &'static [IndexSpec],
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn default_database(&self, client: &Self::Client) -> Result<Self::Database, AppError>;
}

pub struct ConnectionCache<B: DocumentBackend>
{
    backend: B,
    uri: String,
    client: OnceCell<B::Client>,
    indexes_created: AtomicBool,
}

impl<B: DocumentBackend> ConnectionCache<B>
{
    pub fn new(backend: B, uri: impl Into<String>) -> Self
    {
        Self
        {
            backend,
            uri: uri.into(),
            client: OnceCell::new(),
            indexes_created: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool
    {
        self.client.initialized()
    }

    pub async fn get_client(&self) -> Result<B::Client, AppError>
    {
        let client = self.client.get_or_try_init(|| async
        {
            if self.uri.trim().is_empty()
            {
                return Err(AppError::Connection("no connection string configured".to_string()));
            }
            info!("Opening document store connection.");
            self.backend.connect(&self.uri).await
        }).await?;

        Ok(client.clone())
    }

    pub async fn ensure_indexes(&self, client: &B::Client) -> Result<(), AppError>
    {
        if self.indexes_created.load(Ordering::Acquire)
        {
            return Ok(());
        }

        try_join_all(INDEXES.iter().map(|c| self.backend.create_indexes(client, c.collection, c.indexes)))
            .await
            .inspect_err(|e| error!("Index creation failed: {}", e))?;

        self.indexes_created.store(true, Ordering::Release);
        debug!("Secondary indexes are in place.");
        Ok(())
    }

    pub async fn get_database(&self) -> Result<B::Database, AppError>
    {
        let client = self.get_client().await?;
        self.ensure_indexes(&client).await?;
        self.backend.default_database(&client)
    }
}

pub struct MongoBackend;

impl MongoBackend
{
    fn index_model(spec: &IndexSpec) -> IndexModel
    {
        let mut keys = Document::new();
        for (field, direction) in spec.keys
        {
            keys.insert(*field, *direction);
        }

        let mut options = IndexOptions::default();
        if spec.unique
        {
            options.unique = Some(true);
        }
        options.expire_after = spec.expire_after;

        IndexModel::builder().keys(keys).options(options).build()
    }
}

impl DocumentBackend for MongoBackend
{
    type Client = Client;
    type Database = Database;

    async fn connect(&self, uri: &str) -> Result<Client, AppError>
    {
        let client = Client::with_uri_str(uri).await.map_err(|e|
        {
            error!("Invalid document store connection string: {}", e);
            AppError::Connection(e.to_string())
        })?;

        // with_uri_str ne contacte pas le serveur, on vérifie qu'il répond.
        client.database("admin").run_command(doc! { "ping": 1 }, None).await.map_err(|e|
        {
            error!("Document store is unreachable: {}", e);
            AppError::Connection(e.to_string())
        })?;

        Ok(client)
    }

    async fn create_indexes(&self, client: &Client, collection: &'static str, indexes: &'static [IndexSpec]) -> Result<(), AppError>
    {
        let models: Vec<IndexModel> = indexes.iter().map(Self::index_model).collect();
        self.default_database(client)?
            .collection::<Document>(collection)
            .create_indexes(models, None)
            .await?;
        Ok(())
    }

    fn default_database(&self, client: &Client) -> Result<Database, AppError>
    {
        client.default_database()
            .ok_or_else(|| AppError::Connection("connection string names no default database".to_string()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingBackend
    {
        connects: Arc<AtomicUsize>,
        index_calls: Arc<Mutex<Vec<&'static str>>>,
        failing_collection: Option<&'static str>,
        unreachable: bool,
    }

    impl DocumentBackend for CountingBackend
    {
        type Client = usize;
        type Database = &'static str;

        async fn connect(&self, _uri: &str) -> Result<usize, AppError>
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.unreachable
            {
                return Err(AppError::Connection("connection refused".to_string()));
            }
            Ok(self.connects.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn create_indexes(&self, _client: &usize, collection: &'static str, _indexes: &'static [IndexSpec]) -> Result<(), AppError>
        {
            self.index_calls.lock().unwrap().push(collection);
            if self.failing_collection == Some(collection)
            {
                return Err(AppError::InternalServerError);
            }
            Ok(())
        }

        fn default_database(&self, _client: &usize) -> Result<&'static str, AppError>
        {
            Ok("botway")
        }
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_connection()
    {
        let backend = CountingBackend::default();
        let cache = ConnectionCache::new(backend.clone(), "mongodb://localhost/botway");

        let clients = futures::future::join_all((0..16).map(|_| cache.get_client())).await;

        assert_eq!(backend.connects.load(Ordering::SeqCst), 1);
        assert!(clients.iter().all(|c| matches!(c, Ok(1))));
        assert!(cache.is_connected());
    }

    #[tokio::test]
    async fn indexes_are_created_once()
    {
        let backend = CountingBackend::default();
        let cache = ConnectionCache::new(backend.clone(), "mongodb://localhost/botway");

        assert_eq!(cache.get_database().await.unwrap(), "botway");
        cache.get_database().await.unwrap();
        cache.ensure_indexes(&1).await.unwrap();

        let mut calls = backend.index_calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["projects", "tokens", "users"]);
    }

    #[tokio::test]
    async fn failed_index_creation_propagates_and_is_attempted_again()
    {
        let backend = CountingBackend { failing_collection: Some("users"), ..Default::default() };
        let cache = ConnectionCache::new(backend.clone(), "mongodb://localhost/botway");

        assert!(cache.get_database().await.is_err());
        assert!(cache.get_database().await.is_err());
        assert_eq!(backend.index_calls.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn unreachable_store_is_a_connection_error()
    {
        let backend = CountingBackend { unreachable: true, ..Default::default() };
        let cache = ConnectionCache::new(backend, "mongodb://localhost/botway");

        assert!(matches!(cache.get_client().await, Err(AppError::Connection(_))));
        assert!(!cache.is_connected());
    }

    #[tokio::test]
    async fn missing_connection_string_is_a_connection_error()
    {
        let backend = CountingBackend::default();
        let cache = ConnectionCache::new(backend.clone(), "  ");

        assert!(matches!(cache.get_client().await, Err(AppError::Connection(_))));
        assert_eq!(backend.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn declared_indexes_match_the_collections()
    {
        let tokens = &INDEXES[0];
        assert_eq!(tokens.collection, "tokens");
        assert_eq!(tokens.indexes[0].expire_after, Some(Duration::ZERO));

        let users = INDEXES.iter().find(|c| c.collection == "users").unwrap();
        assert!(users.indexes.iter().all(|i| i.unique));

        let projects = INDEXES.iter().find(|c| c.collection == "projects").unwrap();
        assert!(projects.indexes.iter().all(|i| !i.unique && i.keys[0].1 == -1));

        let model = MongoBackend::index_model(&tokens.indexes[0]);
        assert_eq!(model.keys, doc! { "expireAt": -1 });
    }
}
