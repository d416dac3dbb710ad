use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::SourceDescriptor;

/// Category assigned when a provider supplies no categorization.
pub const DEFAULT_CATEGORY: &str = "Technology";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
}

/// The unified post record every adapter emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPost {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Empty when the provider does not expose the body in its listing.
    pub content: String,
    pub slug: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub tags: BTreeSet<String>,
    pub categories: Vec<String>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Minutes
    pub read_time: u32,
    pub is_external: bool,
    pub original_url: String,
    pub source: String,
    pub source_logo: String,
}

impl CanonicalPost {
    /// Skeleton record stamped with the source's identity and logo.
    ///
    /// Adapters fill in the remaining fields from the provider payload.
    pub fn new(
        source: &SourceDescriptor,
        native_id: &str,
        title: String,
        original_url: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: source.scoped_id(native_id),
            title,
            excerpt: String::new(),
            content: String::new(),
            slug: String::new(),
            author_id: source.scoped_id("author"),
            author_name: source.name.clone(),
            author_avatar: None,
            tags: BTreeSet::new(),
            categories: vec![DEFAULT_CATEGORY.to_string()],
            featured_image: None,
            status: PostStatus::Published,
            created_at,
            updated_at: created_at,
            likes_count: 0,
            comments_count: 0,
            read_time: 1,
            is_external: true,
            original_url,
            source: source.name.clone(),
            source_logo: source.logo.clone(),
        }
    }

    /// Short stable digest used when a provider has no native id.
    pub fn digest_id(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }

    /// External posts must link back to where they came from.
    pub fn has_valid_origin(&self) -> bool {
        !self.is_external || !self.original_url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AdapterKind;
    use chrono::TimeZone;

    fn source() -> SourceDescriptor {
        SourceDescriptor::new(
            "Hashnode",
            "https://hashnode.com",
            "https://gql.hashnode.com/",
            "https://hashnode.com/logo.png",
            AdapterKind::Graphql,
        )
    }

    #[test]
    fn test_new_stamps_source_identity() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let post = CanonicalPost::new(
            &source(),
            "abc",
            "Title".into(),
            "https://example.com/p".into(),
            at,
        );
        assert_eq!(post.id, "hashnode-abc");
        assert_eq!(post.source, "Hashnode");
        assert_eq!(post.source_logo, "https://hashnode.com/logo.png");
        assert_eq!(post.categories, vec!["Technology".to_string()]);
        assert!(post.is_external);
        assert_eq!(post.updated_at, at);
    }

    #[test]
    fn test_digest_id_deterministic() {
        let a = CanonicalPost::digest_id("https://example.com/a");
        let b = CanonicalPost::digest_id("https://example.com/a");
        let c = CanonicalPost::digest_id("https://example.com/b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_valid_origin_requires_url() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut post = CanonicalPost::new(&source(), "x", "T".into(), " ".into(), at);
        assert!(!post.has_valid_origin());
        post.original_url = "https://example.com".into();
        assert!(post.has_valid_origin());
    }

    #[test]
    fn test_serializes_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let post = CanonicalPost::new(&source(), "x", "T".into(), "https://e.com".into(), at);
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["isExternal"], true);
        assert_eq!(json["originalUrl"], "https://e.com");
        assert_eq!(json["status"], "published");
        assert!(json.get("createdAt").is_some());
    }
}
