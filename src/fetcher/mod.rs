pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Raw transport used by the source adapters.
///
/// Implementations return the response body for 2xx responses and an
/// error for anything else.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>>;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Vec<u8>>;
}
