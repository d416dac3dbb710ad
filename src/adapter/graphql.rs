use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::adapter::{decode_records, NativeId, SourceAdapter};
use crate::app::{Result, TributaryError};
use crate::config::AdapterConfig;
use crate::domain::{CanonicalPost, SourceDescriptor};
use crate::fetcher::Fetcher;
use crate::normalizer::{non_empty, parse_timestamp, read_time_from_len, slugify};

/// Featured-feed query. The feed does not expose article bodies, so
/// `content` stays empty and `brief` is the summary.
pub struct GraphqlAdapter {
    fetcher: Arc<dyn Fetcher>,
    query: String,
    page_size: usize,
}

impl GraphqlAdapter {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &AdapterConfig) -> Self {
        Self {
            fetcher,
            query: feed_query(config.page_size),
            page_size: config.page_size,
        }
    }
}

fn feed_query(first: usize) -> String {
    format!(
        r#"query {{
  feed(first: {first}, filter: {{ type: FEATURED }}) {{
    edges {{
      node {{
        id
        title
        brief
        slug
        url
        coverImage {{ url }}
        publishedAt
        updatedAt
        readTimeInMinutes
        reactionCount
        responseCount
        tags {{ name }}
        author {{ id name profilePicture }}
      }}
    }}
  }}
}}"#
    )
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<FeedData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FeedData {
    feed: Option<Feed>,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    edges: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    id: Option<NativeId>,
    title: Option<String>,
    brief: Option<String>,
    slug: Option<String>,
    url: Option<String>,
    cover_image: Option<CoverImage>,
    published_at: Option<String>,
    updated_at: Option<String>,
    read_time_in_minutes: Option<u32>,
    reaction_count: Option<u64>,
    response_count: Option<u64>,
    tags: Option<Vec<Tag>>,
    author: Option<Author>,
}

/// Older schema versions return the cover as a bare URL.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoverImage {
    Url(String),
    Object { url: Option<String> },
}

impl CoverImage {
    fn into_url(self) -> Option<String> {
        match self {
            CoverImage::Url(url) => Some(url),
            CoverImage::Object { url } => url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    id: Option<NativeId>,
    name: Option<String>,
    profile_picture: Option<String>,
}

#[async_trait]
impl SourceAdapter for GraphqlAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
        let body = self
            .fetcher
            .post_json(&source.endpoint, &json!({ "query": self.query }))
            .await?;

        let response: GraphqlResponse = serde_json::from_slice(&body)?;
        let messages = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        let Some(feed) = response.data.and_then(|d| d.feed) else {
            return Err(TributaryError::Graphql(if messages.is_empty() {
                "response contains no feed".to_string()
            } else {
                messages
            }));
        };

        if !messages.is_empty() {
            tracing::warn!(source = %source.name, "partial GraphQL errors: {}", messages);
        }

        Ok(decode_records::<Edge>(source, feed.edges)
            .into_iter()
            .filter_map(|edge| edge.node)
            .filter_map(|node| map_node(source, node))
            .take(self.page_size)
            .collect())
    }
}

fn map_node(source: &SourceDescriptor, node: Node) -> Option<CanonicalPost> {
    let (Some(id), Some(title), Some(url), Some(created_at)) = (
        node.id.filter(|id| !id.is_blank()),
        non_empty(node.title),
        non_empty(node.url),
        node.published_at.as_deref().and_then(parse_timestamp),
    ) else {
        tracing::debug!(source = %source.name, "skipping node missing id, title, url or date");
        return None;
    };

    let mut post = CanonicalPost::new(source, &id.to_string(), title, url, created_at);

    post.excerpt = non_empty(node.brief).unwrap_or_else(|| post.title.clone());
    post.slug = non_empty(node.slug).unwrap_or_else(|| slugify(&post.title));
    post.featured_image = node.cover_image.and_then(CoverImage::into_url).filter(|u| !u.is_empty());
    post.updated_at = node
        .updated_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);
    post.likes_count = node.reaction_count.unwrap_or(0);
    post.comments_count = node.response_count.unwrap_or(0);
    post.tags = node
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| non_empty(t.name))
        .collect();

    if let Some(author) = node.author {
        if let Some(aid) = author.id.filter(|id| !id.is_blank()) {
            post.author_id = source.scoped_id(aid);
        }
        if let Some(name) = non_empty(author.name) {
            post.author_name = name;
        }
        post.author_avatar = non_empty(author.profile_picture);
    }

    post.read_time = node
        .read_time_in_minutes
        .filter(|m| *m > 0)
        .unwrap_or_else(|| read_time_from_len(&post.excerpt));

    Some(post)
}
