//! Source adapters: one per provider family.
//!
//! Each adapter issues the provider-specific request through a
//! [`Fetcher`] and maps the provider's response schema into
//! [`CanonicalPost`] records. [`AdapterSet`] is the failure boundary: it
//! turns every error or timeout into a [`FetchOutcome::Failed`] so that one
//! broken source never affects the others.

pub mod graphql;
pub mod rest_json;
pub mod rss_proxy;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app::{Result, TributaryError};
use crate::config::{AdapterConfig, RssProxyConfig};
use crate::domain::{AdapterKind, CanonicalPost, SourceDescriptor};
use crate::fetcher::Fetcher;

pub use graphql::GraphqlAdapter;
pub use rest_json::RestJsonAdapter;
pub use rss_proxy::RssProxyAdapter;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CanonicalPost>>;
}

/// Outcome of one source fetch, kept distinct for logging and reporting.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Vec<CanonicalPost>),
    Failed(String),
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FetchOutcome::Fetched(_) => None,
            FetchOutcome::Failed(reason) => Some(reason),
        }
    }

    /// Failures contribute nothing.
    pub fn into_posts(self) -> Vec<CanonicalPost> {
        match self {
            FetchOutcome::Fetched(posts) => posts,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// One adapter per [`AdapterKind`], selected by the descriptor's kind.
#[derive(Clone)]
pub struct AdapterSet {
    rest_json: Arc<dyn SourceAdapter>,
    graphql: Arc<dyn SourceAdapter>,
    rss_proxy: Arc<dyn SourceAdapter>,
}

impl AdapterSet {
    pub fn new(
        rest_json: Arc<dyn SourceAdapter>,
        graphql: Arc<dyn SourceAdapter>,
        rss_proxy: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self {
            rest_json,
            graphql,
            rss_proxy,
        }
    }

    /// Wire the three HTTP-backed adapters onto one shared fetcher.
    pub fn http(
        fetcher: Arc<dyn Fetcher>,
        adapters: &AdapterConfig,
        proxy: &RssProxyConfig,
    ) -> Self {
        Self::new(
            Arc::new(RestJsonAdapter::new(fetcher.clone(), adapters)),
            Arc::new(GraphqlAdapter::new(fetcher.clone(), adapters)),
            Arc::new(RssProxyAdapter::new(fetcher, adapters, &proxy.endpoint)),
        )
    }

    pub fn for_kind(&self, kind: AdapterKind) -> &Arc<dyn SourceAdapter> {
        match kind {
            AdapterKind::RestJson => &self.rest_json,
            AdapterKind::Graphql => &self.graphql,
            AdapterKind::RssProxy => &self.rss_proxy,
        }
    }

    /// Fetch one source, bounded by `timeout`. Never returns an error.
    pub async fn fetch(&self, source: &SourceDescriptor, timeout: Duration) -> FetchOutcome {
        let adapter = self.for_kind(source.kind);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, adapter.fetch(source)).await {
            Ok(Ok(posts)) => FetchOutcome::Fetched(posts),
            Ok(Err(e)) => FetchOutcome::Failed(e.to_string()),
            Err(_) => FetchOutcome::Failed(TributaryError::Timeout(timeout).to_string()),
        };

        match &outcome {
            FetchOutcome::Fetched(posts) => debug!(
                source = %source.name,
                kind = %source.kind,
                count = posts.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "source fetched"
            ),
            FetchOutcome::Failed(reason) => warn!(
                source = %source.name,
                kind = %source.kind,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "source fetch failed: {}",
                reason
            ),
        }

        outcome
    }
}

/// Decode provider records one at a time. A record that does not fit the
/// schema is dropped without affecting its siblings.
pub(crate) fn decode_records<T: DeserializeOwned>(
    source: &SourceDescriptor,
    records: Vec<serde_json::Value>,
) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(source = %source.name, "skipping undecodable record: {}", e);
                None
            }
        })
        .collect()
}

/// Provider-native identifier, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum NativeId {
    Number(u64),
    Text(String),
}

impl NativeId {
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, NativeId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeId::Number(n) => write!(f, "{}", n),
            NativeId::Text(s) => f.write_str(s),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;
    use crate::registry::default_sources;

    struct SlowAdapter;

    #[async_trait]
    impl SourceAdapter for SlowAdapter {
        async fn fetch(&self, _source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    struct BrokenAdapter;

    #[async_trait]
    impl SourceAdapter for BrokenAdapter {
        async fn fetch(&self, _source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
            Err(TributaryError::Other("boom".into()))
        }
    }

    fn stub_set(body: &str) -> AdapterSet {
        let fetcher: Arc<dyn Fetcher> = StubFetcher::body(body);
        AdapterSet::http(fetcher, &AdapterConfig::default(), &RssProxyConfig::default())
    }

    #[test]
    fn test_outcome_flattening() {
        assert!(FetchOutcome::Failed("x".into()).into_posts().is_empty());
        assert_eq!(FetchOutcome::Failed("x".into()).failure(), Some("x"));
        assert!(FetchOutcome::Fetched(Vec::new()).is_ok());
    }

    #[test]
    fn test_native_id_display() {
        let n: NativeId = serde_json::from_str("42").unwrap();
        let s: NativeId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(n.to_string(), "42");
        assert_eq!(s.to_string(), "abc");
        assert!(NativeId::Text(" ".into()).is_blank());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty_for_every_kind() {
        let fetcher: Arc<dyn Fetcher> = StubFetcher::status(503);
        let set = AdapterSet::http(fetcher, &AdapterConfig::default(), &RssProxyConfig::default());

        for source in default_sources() {
            let outcome = set.fetch(&source, Duration::from_secs(5)).await;
            assert!(!outcome.is_ok(), "{} should fail", source.name);
            assert!(outcome.into_posts().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty_for_every_kind() {
        let set = stub_set("<html>not json</html>");

        for source in default_sources() {
            let outcome = set.fetch(&source, Duration::from_secs(5)).await;
            assert!(outcome.failure().is_some(), "{} should fail", source.name);
        }
    }

    #[tokio::test]
    async fn test_timeout_is_contained() {
        let slow: Arc<dyn SourceAdapter> = Arc::new(SlowAdapter);
        let set = AdapterSet::new(slow.clone(), slow.clone(), slow);
        let source = &default_sources()[0];

        let started = Instant::now();
        let outcome = set.fetch(source, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(outcome.failure().unwrap().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_dispatch_by_kind() {
        let slow: Arc<dyn SourceAdapter> = Arc::new(SlowAdapter);
        let broken: Arc<dyn SourceAdapter> = Arc::new(BrokenAdapter);
        let set = AdapterSet::new(broken, slow.clone(), slow);
        let sources = default_sources();

        // rest_json goes to the broken adapter and fails immediately
        let outcome = set.fetch(&sources[0], Duration::from_secs(5)).await;
        assert_eq!(outcome.failure(), Some("boom"));

        // graphql goes to the slow adapter and times out
        let outcome = set.fetch(&sources[1], Duration::from_millis(20)).await;
        assert!(outcome.failure().unwrap().contains("Timed out"));
    }
}
