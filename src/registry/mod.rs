//! Static, ordered catalog of configured sources.
//!
//! Registry order is fan-out order, and therefore the tie-break order when
//! two posts share a timestamp.

use std::collections::HashSet;

use crate::app::{Result, TributaryError};
use crate::domain::{AdapterKind, SourceDescriptor};

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            if source.name.trim().is_empty() {
                return Err(TributaryError::Config("source with empty name".into()));
            }
            if source.endpoint.trim().is_empty() {
                return Err(TributaryError::Config(format!(
                    "source {} has no endpoint",
                    source.name
                )));
            }
            if !seen.insert(source.id_prefix()) {
                return Err(TributaryError::Config(format!(
                    "duplicate source name: {}",
                    source.name
                )));
            }
        }
        Ok(Self { sources })
    }

    pub fn get(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn find_ignore_case(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            sources: default_sources(),
        }
    }
}

pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "Dev.to",
            "https://dev.to",
            "https://dev.to/api/articles",
            "https://dev-to-uploads.s3.amazonaws.com/uploads/logos/resized_logo_UQww2soKuUsjaOGNB38o.png",
            AdapterKind::RestJson,
        ),
        SourceDescriptor::new(
            "Hashnode",
            "https://hashnode.com",
            "https://gql.hashnode.com/",
            "https://cdn.hashnode.com/res/hashnode/image/upload/v1611902473383/CDyAuTy75.png",
            AdapterKind::Graphql,
        ),
        SourceDescriptor::new(
            "FreeCodeCamp",
            "https://freecodecamp.org",
            "https://www.freecodecamp.org/news/rss/",
            "https://cdn.freecodecamp.org/platform/universal/fcc_primary.svg",
            AdapterKind::RssProxy,
        ),
        SourceDescriptor::new(
            "CSS-Tricks",
            "https://css-tricks.com",
            "https://css-tricks.com/feed/",
            "https://css-tricks.com/wp-content/uploads/2019/06/akqcss.jpg",
            AdapterKind::RssProxy,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(name: &str, endpoint: &str) -> SourceDescriptor {
        SourceDescriptor::new(name, "", endpoint, "", AdapterKind::RssProxy)
    }

    #[test]
    fn test_default_registry_order() {
        let registry = SourceRegistry::default();
        let names: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Dev.to", "Hashnode", "FreeCodeCamp", "CSS-Tricks"]);
    }

    #[test]
    fn test_default_sources_pass_validation() {
        let registry = SourceRegistry::new(default_sources()).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_lookup() {
        let registry = SourceRegistry::default();
        assert_eq!(registry.get("Hashnode").unwrap().kind, AdapterKind::Graphql);
        assert!(registry.get("hashnode").is_none());
        assert_eq!(
            registry.find_ignore_case(" css-tricks ").unwrap().name,
            "CSS-Tricks"
        );
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = SourceRegistry::new(vec![
            rss("Blog", "https://a.example/feed"),
            rss("BLOG", "https://b.example/feed"),
        ]);
        assert!(matches!(result, Err(TributaryError::Config(_))));
    }

    #[test]
    fn test_rejects_missing_endpoint() {
        let result = SourceRegistry::new(vec![rss("Blog", " ")]);
        assert!(matches!(result, Err(TributaryError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_name() {
        let result = SourceRegistry::new(vec![rss("", "https://a.example/feed")]);
        assert!(result.is_err());
    }
}
