use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapter::{decode_records, NativeId, SourceAdapter};
use crate::app::Result;
use crate::config::AdapterConfig;
use crate::domain::{CanonicalPost, SourceDescriptor};
use crate::fetcher::Fetcher;
use crate::normalizer::{non_empty, parse_timestamp, read_time_from_len, read_time_from_words, slugify};

/// Paginated articles endpoint, ranked by the provider's own "top" metric
/// over a recent window.
pub struct RestJsonAdapter {
    fetcher: Arc<dyn Fetcher>,
    page_size: usize,
    top_days: u32,
}

impl RestJsonAdapter {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &AdapterConfig) -> Self {
        Self {
            fetcher,
            page_size: config.page_size,
            top_days: config.top_days,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Article {
    id: Option<NativeId>,
    title: Option<String>,
    description: Option<String>,
    body_markdown: Option<String>,
    slug: Option<String>,
    url: Option<String>,
    cover_image: Option<String>,
    social_image: Option<String>,
    published_at: Option<String>,
    edited_at: Option<String>,
    #[serde(default)]
    tag_list: Option<TagList>,
    positive_reactions_count: Option<u64>,
    public_reactions_count: Option<u64>,
    comments_count: Option<u64>,
    reading_time_minutes: Option<u32>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(alias = "id")]
    user_id: Option<NativeId>,
    name: Option<String>,
    username: Option<String>,
    profile_image: Option<String>,
}

/// Listings send tags as an array, single-article responses as "a, b".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagList {
    List(Vec<String>),
    Joined(String),
}

impl TagList {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagList::List(tags) => tags,
            TagList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for RestJsonAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
        let per_page = self.page_size.to_string();
        let top = self.top_days.to_string();
        let body = self
            .fetcher
            .get(&source.endpoint, &[("per_page", per_page.as_str()), ("top", top.as_str())])
            .await?;

        let records: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        Ok(decode_records::<Article>(source, records)
            .into_iter()
            .filter_map(|article| map_article(source, article))
            .take(self.page_size)
            .collect())
    }
}

fn map_article(source: &SourceDescriptor, article: Article) -> Option<CanonicalPost> {
    let (Some(id), Some(title), Some(url), Some(created_at)) = (
        article.id.filter(|id| !id.is_blank()),
        non_empty(article.title),
        non_empty(article.url),
        article.published_at.as_deref().and_then(parse_timestamp),
    ) else {
        tracing::debug!(source = %source.name, "skipping article missing id, title, url or date");
        return None;
    };

    let mut post = CanonicalPost::new(source, &id.to_string(), title, url, created_at);

    post.excerpt = non_empty(article.description).unwrap_or_else(|| post.title.clone());
    post.content = article.body_markdown.unwrap_or_default();
    post.slug = non_empty(article.slug).unwrap_or_else(|| slugify(&post.title));
    post.featured_image = non_empty(article.cover_image).or(non_empty(article.social_image));
    post.updated_at = article
        .edited_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);
    post.likes_count = article
        .positive_reactions_count
        .or(article.public_reactions_count)
        .unwrap_or(0);
    post.comments_count = article.comments_count.unwrap_or(0);
    post.tags = article
        .tag_list
        .map(TagList::into_tags)
        .unwrap_or_default()
        .into_iter()
        .collect();

    if let Some(user) = article.user {
        if let Some(uid) = user.user_id.filter(|id| !id.is_blank()) {
            post.author_id = source.scoped_id(uid);
        }
        if let Some(name) = non_empty(user.name).or(non_empty(user.username)) {
            post.author_name = name;
        }
        post.author_avatar = non_empty(user.profile_image);
    }

    post.read_time = match article.reading_time_minutes.filter(|m| *m > 0) {
        Some(minutes) => minutes,
        None if !post.content.is_empty() => read_time_from_words(&post.content),
        None => read_time_from_len(&post.excerpt),
    };

    Some(post)
}
