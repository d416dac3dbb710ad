//! HTTP surface for the front-end: the aggregator is built once by the
//! process bootstrap and shared by every request through router state.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::aggregator::{Aggregator, SourceSummary};
use crate::app::Result;
use crate::domain::CanonicalPost;

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/posts", get(list_posts))
        .route("/api/refresh", post(refresh))
        .route("/api/sources", get(list_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(aggregator)
}

/// Bind, warm the cache in the background and serve until Ctrl-C.
pub async fn serve(addr: &str, aggregator: Arc<Aggregator>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let warm = aggregator.clone();
    tokio::spawn(async move {
        let posts = warm.get_posts().await;
        info!("Cache warmed with {} posts", posts.len());
    });

    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    source: Option<String>,
    limit: Option<usize>,
}

async fn list_posts(
    State(aggregator): State<Arc<Aggregator>>,
    Query(query): Query<PostsQuery>,
) -> Json<Vec<CanonicalPost>> {
    let source = query
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"));

    let mut posts = match source {
        Some(name) => aggregator.posts_from(name).await,
        None => aggregator.get_posts().await,
    };
    if let Some(limit) = query.limit {
        posts.truncate(limit);
    }
    Json(posts)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    count: usize,
    fetched_at: Option<DateTime<Utc>>,
}

async fn refresh(State(aggregator): State<Arc<Aggregator>>) -> Json<RefreshResponse> {
    aggregator.refresh().await;
    let entry = aggregator.snapshot();
    Json(RefreshResponse {
        count: entry.as_ref().map(|e| e.value.posts.len()).unwrap_or(0),
        fetched_at: entry.map(|e| e.fetched_at),
    })
}

async fn list_sources(State(aggregator): State<Arc<Aggregator>>) -> Json<Vec<SourceSummary>> {
    Json(aggregator.source_summaries().await)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::TimeZone;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::adapter::{AdapterSet, SourceAdapter};
    use crate::app::TributaryError;
    use crate::config::AggregatorConfig;
    use crate::domain::SourceDescriptor;
    use crate::registry::SourceRegistry;

    const BODY_LIMIT: usize = 1024 * 1024;

    /// Three posts per source, except Hashnode which is down.
    struct FixedAdapter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CanonicalPost>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if source.name == "Hashnode" {
                return Err(TributaryError::Other("down".into()));
            }
            Ok((1..=3)
                .map(|i| {
                    CanonicalPost::new(
                        source,
                        &i.to_string(),
                        format!("Post {}", i),
                        format!("{}/p/{}", source.site_url, i),
                        Utc.with_ymd_and_hms(2024, 1, i, 0, 0, 0).unwrap(),
                    )
                })
                .collect())
        }
    }

    fn app() -> (Router, Arc<FixedAdapter>) {
        let stub = Arc::new(FixedAdapter {
            calls: AtomicUsize::new(0),
        });
        let adapter: Arc<dyn SourceAdapter> = stub.clone();
        let aggregator = Aggregator::new(
            SourceRegistry::default(),
            AdapterSet::new(adapter.clone(), adapter.clone(), adapter),
            AggregatorConfig::default(),
        );
        (router(Arc::new(aggregator)), stub)
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_posts_merged_and_cached() {
        let (app, stub) = app();

        let (status, body) = call(&app, "GET", "/api/posts").await;
        assert_eq!(status, StatusCode::OK);
        let posts = body.as_array().unwrap();
        // Four sources, one down, three posts each
        assert_eq!(posts.len(), 9);
        assert_eq!(posts[0]["isExternal"], true);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 4);

        let (_, again) = call(&app, "GET", "/api/posts").await;
        assert_eq!(again, body);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_posts_source_filter_and_limit() {
        let (app, _) = app();

        let (_, body) = call(&app, "GET", "/api/posts?source=css-tricks").await;
        let posts = body.as_array().unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p["source"] == "CSS-Tricks"));

        let (_, body) = call(&app, "GET", "/api/posts?source=all&limit=2").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_fans_out_again() {
        let (app, stub) = app();
        call(&app, "GET", "/api/posts").await;

        let (status, body) = call(&app, "POST", "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 9);
        assert!(body["fetchedAt"].is_string());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_sources_report_counts_and_failures() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/api/sources").await;
        assert_eq!(status, StatusCode::OK);

        let sources = body.as_array().unwrap();
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0]["name"], "Dev.to");
        assert_eq!(sources[0]["count"], 3);
        assert_eq!(sources[0]["kind"], "rest_json");
        assert_eq!(sources[1]["name"], "Hashnode");
        assert_eq!(sources[1]["count"], 0);
        assert_eq!(sources[1]["lastReport"]["ok"], false);
    }
}
