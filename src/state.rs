use std::sync::Arc;
use mongodb::Database;
use crate::config::Config;
use crate::error::AppError;
use crate::services::connection::{ConnectionCache, MongoBackend};
use crate::services::poller::PollSettings;

pub type AppState = Arc<InnerState>;

pub struct InnerState
{
    pub config : Config,
    pub http_client: reqwest::Client,
    pub store: ConnectionCache<MongoBackend>,
}

impl InnerState
{
    pub fn new(config: Config) -> AppState
    {
        let store = ConnectionCache::new(MongoBackend, config.mongo_url.clone());

        Arc::new(Self
        {
            config,
            http_client: reqwest::Client::new(),
            store,
        })
    }

    pub async fn db(&self) -> Result<Database, AppError>
    {
        self.store.get_database().await
    }

    pub fn poll_settings(&self) -> PollSettings
    {
        PollSettings::new(self.config.poll_interval_ms, self.config.poll_max_backoff_ms)
    }
}
