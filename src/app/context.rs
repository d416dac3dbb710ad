use std::path::Path;
use std::sync::Arc;

use crate::adapter::AdapterSet;
use crate::aggregator::Aggregator;
use crate::app::error::{Result, TributaryError};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::registry::SourceRegistry;

/// Process-wide wiring: one HTTP client, one registry and one aggregator
/// whose cache is shared by every caller.
pub struct AppContext {
    pub config: Config,
    pub aggregator: Arc<Aggregator>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.http)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Load the config file (default path when `None`) and build the context.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path).map_err(|e| TributaryError::Config(e.to_string()))?;
        Self::new(config)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let registry = SourceRegistry::new(config.sources.clone())?;
        let adapters = AdapterSet::http(fetcher, &config.adapters, &config.rss_proxy);
        let aggregator = Arc::new(Aggregator::new(
            registry,
            adapters,
            config.aggregator.clone(),
        ));

        Ok(Self { config, aggregator })
    }
}
