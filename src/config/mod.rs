//! Configuration management for Tributary.
//!
//! Configuration is read from `~/.config/tributary/config.toml` at startup
//! unless a path is given explicitly. If the default file doesn't exist, one
//! with commented defaults is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::SourceDescriptor;
use crate::registry;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub aggregator: AggregatorConfig,
    pub http: HttpConfig,
    pub adapters: AdapterConfig,
    pub rss_proxy: RssProxyConfig,
    pub sources: Vec<SourceDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            aggregator: AggregatorConfig::default(),
            http: HttpConfig::default(),
            adapters: AdapterConfig::default(),
            rss_proxy: RssProxyConfig::default(),
            sources: registry::default_sources(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `tributary serve`
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Maximum age of a cached batch before it is refetched (default: 1800)
    pub freshness_secs: u64,
    /// Number of posts kept after merging (default: 50)
    pub max_posts: usize,
    /// Upper bound on a single source fetch, in seconds (default: 10)
    pub adapter_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            freshness_secs: 30 * 60,
            max_posts: 50,
            adapter_timeout_secs: 10,
        }
    }
}

impl AggregatorConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Whole-request timeout in seconds (default: 8)
    pub timeout_secs: u64,
    /// TCP/TLS connect timeout in seconds (default: 5)
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tributary/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 8,
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Items requested from (and kept per) source (default: 10)
    pub page_size: usize,
    /// Trending window in days for REST sources (default: 7)
    pub top_days: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            top_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RssProxyConfig {
    /// Feed-to-JSON translation endpoint; the feed URL is passed as `rss_url`
    pub endpoint: String,
}

impl Default for RssProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.rss2json.com/v1/api.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used and
    /// created with commented defaults if missing. Missing fields fall back to
    /// default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = Self::default_config_path()?;
                if !p.exists() {
                    Self::create_default_config(&p)?;
                    return Ok(Self::default());
                }
                p
            }
        };

        Self::from_file(&config_path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/tributary/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tributary").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(())
    }

    /// Default config file content with comments.
    pub fn default_config_content() -> &'static str {
        r##"# Tributary Configuration

[server]
# Address for `tributary serve`
addr = "127.0.0.1:8080"

[aggregator]
# Cached posts are served until they are this old (seconds)
freshness_secs = 1800

# Posts kept after merging all sources, most recent first
max_posts = 50

# A source that takes longer than this (seconds) contributes nothing
adapter_timeout_secs = 10

[http]
timeout_secs = 8
connect_timeout_secs = 5

[adapters]
# Items requested from each source
page_size = 10

# Trending window for REST sources (days)
top_days = 7

[rss_proxy]
# RSS feeds are translated to JSON by this service
endpoint = "https://api.rss2json.com/v1/api.json"

# Sources are fetched concurrently; kind is one of rest_json, graphql, rss_proxy.
# For rss_proxy sources, endpoint is the feed URL.

[[sources]]
name = "Dev.to"
site_url = "https://dev.to"
endpoint = "https://dev.to/api/articles"
logo = "https://dev-to-uploads.s3.amazonaws.com/uploads/logos/resized_logo_UQww2soKuUsjaOGNB38o.png"
kind = "rest_json"

[[sources]]
name = "Hashnode"
site_url = "https://hashnode.com"
endpoint = "https://gql.hashnode.com/"
logo = "https://cdn.hashnode.com/res/hashnode/image/upload/v1611902473383/CDyAuTy75.png"
kind = "graphql"

[[sources]]
name = "FreeCodeCamp"
site_url = "https://freecodecamp.org"
endpoint = "https://www.freecodecamp.org/news/rss/"
logo = "https://cdn.freecodecamp.org/platform/universal/fcc_primary.svg"
kind = "rss_proxy"

[[sources]]
name = "CSS-Tricks"
site_url = "https://css-tricks.com"
endpoint = "https://css-tricks.com/feed/"
logo = "https://css-tricks.com/wp-content/uploads/2019/06/akqcss.jpg"
kind = "rss_proxy"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
