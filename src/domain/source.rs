use serde::{Deserialize, Serialize};

/// Which provider family a source speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Paginated JSON articles endpoint (GET)
    RestJson,
    /// GraphQL feed query (POST)
    Graphql,
    /// RSS/Atom feed translated to JSON by a proxy service (GET)
    RssProxy,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::RestJson => "rest_json",
            AdapterKind::Graphql => "graphql",
            AdapterKind::RssProxy => "rss_proxy",
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured external content source.
///
/// `name` is both the display label and the lookup key. For `rss_proxy`
/// sources `endpoint` is the feed URL handed to the proxy, not the proxy
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(default)]
    pub site_url: String,
    pub endpoint: String,
    #[serde(default)]
    pub logo: String,
    pub kind: AdapterKind,
}

impl SourceDescriptor {
    pub fn new(
        name: impl Into<String>,
        site_url: impl Into<String>,
        endpoint: impl Into<String>,
        logo: impl Into<String>,
        kind: AdapterKind,
    ) -> Self {
        Self {
            name: name.into(),
            site_url: site_url.into(),
            endpoint: endpoint.into(),
            logo: logo.into(),
            kind,
        }
    }

    /// Prefix used for every post id and author id minted from this source.
    pub fn id_prefix(&self) -> String {
        self.name.to_lowercase()
    }

    /// Namespaced id for a provider-native identifier.
    pub fn scoped_id(&self, native: impl std::fmt::Display) -> String {
        format!("{}-{}", self.id_prefix(), native)
    }
}
