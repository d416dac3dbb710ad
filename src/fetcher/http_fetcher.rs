use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use url::Url;

use crate::app::{Result, TributaryError};
use crate::config::HttpConfig;
use crate::fetcher::Fetcher;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    async fn read_body(url: &str, response: Response) -> Result<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(TributaryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Append query pairs to a base URL, percent-encoding values.
pub fn build_url(base: &str, query: &[(&str, &str)]) -> Result<Url> {
    if query.is_empty() {
        return Ok(Url::parse(base)?);
    }
    Ok(Url::parse_with_params(base, query)?)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let target = build_url(url, query)?;
        tracing::debug!("GET {}", target);

        let response = self
            .client
            .get(target)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_body(url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let target = build_url(url, &[])?;
        tracing::debug!("POST {}", target);

        let response = self
            .client
            .post(target)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        Self::read_body(url, response).await
    }
}
