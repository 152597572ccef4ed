use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::HackathonStore;
use crate::models::ScrapeSummary;

/// Shared application state, built once at startup and handed to every
/// handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: HackathonStore,
    pub http_client: reqwest::Client,
    pub last_scrape: Arc<RwLock<Option<ScrapeSummary>>>,
}

impl AppState {
    /// Connect to the configured database (creating the schema) and build
    /// the provider HTTP client.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = HackathonStore::connect(&config.database_url).await?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: HackathonStore) -> anyhow::Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            store,
            http_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()?,
            last_scrape: Arc::new(RwLock::new(None)),
        })
    }

    pub fn record_scrape(&self, summary: ScrapeSummary) {
        *self.last_scrape.write() = Some(summary);
    }

    pub fn last_scrape(&self) -> Option<ScrapeSummary> {
        self.last_scrape.read().clone()
    }
}
