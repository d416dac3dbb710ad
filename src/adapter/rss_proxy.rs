use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapter::{decode_records, SourceAdapter};
use crate::app::{Result, TributaryError};
use crate::config::AdapterConfig;
use crate::domain::{CanonicalPost, SourceDescriptor};
use crate::fetcher::Fetcher;
use crate::normalizer::{excerpt, non_empty, parse_timestamp, read_time_from_len, slugify};

/// RSS/Atom feeds read through a feed-to-JSON translation service.
///
/// The feed wire format is never parsed here; the proxy receives the feed
/// URL as `rss_url` and answers with `{ status, items: [...] }`.
pub struct RssProxyAdapter {
    fetcher: Arc<dyn Fetcher>,
    proxy_endpoint: String,
    page_size: usize,
}

impl RssProxyAdapter {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &AdapterConfig, proxy_endpoint: &str) -> Self {
        Self {
            fetcher,
            proxy_endpoint: proxy_endpoint.to_string(),
            page_size: config.page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyItem {
    title: Option<String>,
    pub_date: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    author: Option<String>,
    thumbnail: Option<String>,
    description: Option<String>,
    content: Option<String>,
    enclosure: Option<Enclosure>,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Enclosure {
    link: Option<String>,
}

#[async_trait]
impl SourceAdapter for RssProxyAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
        let body = self
            .fetcher
            .get(&self.proxy_endpoint, &[("rss_url", source.endpoint.as_str())])
            .await?;

        let response: ProxyResponse = serde_json::from_slice(&body)?;
        if let Some(status) = response.status.as_deref() {
            if !status.eq_ignore_ascii_case("ok") {
                return Err(TributaryError::Proxy(
                    response.message.unwrap_or_else(|| format!("status {}", status)),
                ));
            }
        }

        let mut items = response.items;
        items.truncate(self.page_size);
        Ok(decode_records::<ProxyItem>(source, items)
            .into_iter()
            .filter_map(|item| map_item(source, item))
            .collect())
    }
}

fn map_item(source: &SourceDescriptor, item: ProxyItem) -> Option<CanonicalPost> {
    let (Some(title), Some(link), Some(created_at)) = (
        non_empty(item.title),
        non_empty(item.link),
        item.pub_date.as_deref().and_then(parse_timestamp),
    ) else {
        tracing::debug!(source = %source.name, "skipping feed item missing title, link or date");
        return None;
    };

    let native = non_empty(item.guid).unwrap_or_else(|| link.clone());
    let mut post = CanonicalPost::new(
        source,
        &CanonicalPost::digest_id(&native),
        title,
        link,
        created_at,
    );

    let description = non_empty(item.description);
    let body = non_empty(item.content).or_else(|| description.clone());

    post.excerpt = description
        .as_deref()
        .or(body.as_deref())
        .map(excerpt)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| post.title.clone());
    post.read_time = read_time_from_len(body.as_deref().unwrap_or_default());
    post.content = body.unwrap_or_default();
    post.slug = slugify(&post.title);
    post.featured_image = non_empty(item.thumbnail)
        .or_else(|| item.enclosure.and_then(|e| non_empty(e.link)));
    post.tags = item
        .categories
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if let Some(author) = non_empty(item.author) {
        post.author_id = source.scoped_id(slugify(&author));
        post.author_name = author;
    }

    Some(post)
}
