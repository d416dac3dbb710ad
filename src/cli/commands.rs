use crate::aggregator::SourceSummary;
use crate::app::{AppContext, Result};
use crate::domain::CanonicalPost;
use crate::server;

pub async fn list_posts(
    ctx: &AppContext,
    source: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut posts = match source {
        Some(name) => {
            if ctx.aggregator.registry().find_ignore_case(name).is_none() {
                eprintln!("Unknown source: {}", name);
            }
            ctx.aggregator.posts_from(name).await
        }
        None => ctx.aggregator.get_posts().await,
    };
    if let Some(limit) = limit {
        posts.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    if posts.is_empty() {
        println!("No posts");
        return Ok(());
    }

    for post in &posts {
        println!("{}", format_post_line(post));
    }
    Ok(())
}

pub async fn list_sources(ctx: &AppContext) -> Result<()> {
    for summary in ctx.aggregator.source_summaries().await {
        println!("{}", format_source_line(&summary));
    }
    Ok(())
}

pub async fn serve(ctx: &AppContext, addr: Option<&str>) -> Result<()> {
    let addr = addr.unwrap_or(ctx.config.server.addr.as_str());
    server::serve(addr, ctx.aggregator.clone()).await
}

fn format_post_line(post: &CanonicalPost) -> String {
    format!(
        "{}  [{}] {} ({} min)\n    {}",
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.source,
        post.title,
        post.read_time,
        post.original_url
    )
}

fn format_source_line(summary: &SourceSummary) -> String {
    let status = match &summary.last_report {
        Some(r) if r.ok => format!("ok in {}ms", r.elapsed_ms),
        Some(r) => format!("failed: {}", r.error.as_deref().unwrap_or("unknown error")),
        None => "not fetched".to_string(),
    };
    format!(
        "{:<14} {:<10} {:>3} posts  {}",
        summary.name,
        summary.kind.as_str(),
        summary.count,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::StubFetcher;
    use crate::aggregator::SourceReport;
    use crate::config::Config;
    use crate::domain::{AdapterKind, SourceDescriptor};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_list_posts_json_and_plain() {
        let fetcher = StubFetcher::body("[]");
        let ctx = AppContext::with_fetcher(Config::default(), fetcher.clone()).unwrap();

        assert!(list_posts(&ctx, None, Some(5), true).await.is_ok());
        assert!(list_posts(&ctx, Some("dev.to"), None, false).await.is_ok());
        // One cycle served both calls
        assert_eq!(ctx.aggregator.cycles_run(), 1);
    }

    #[test]
    fn test_format_post_line() {
        let source = SourceDescriptor::new(
            "Dev.to",
            "https://dev.to",
            "https://dev.to/api/articles",
            "",
            AdapterKind::RestJson,
        );
        let mut post = CanonicalPost::new(
            &source,
            "1",
            "Hello".to_string(),
            "https://dev.to/a/hello".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        );
        post.read_time = 4;

        assert_eq!(
            format_post_line(&post),
            "2024-03-01 12:30  [Dev.to] Hello (4 min)\n    https://dev.to/a/hello"
        );
    }

    #[test]
    fn test_format_source_line_failure() {
        let summary = SourceSummary {
            name: "Hashnode".to_string(),
            site_url: "https://hashnode.com".to_string(),
            logo: String::new(),
            kind: AdapterKind::Graphql,
            count: 0,
            last_report: Some(SourceReport {
                source: "Hashnode".to_string(),
                ok: false,
                fetched: 0,
                error: Some("timed out".to_string()),
                elapsed_ms: 10_000,
            }),
        };
        let line = format_source_line(&summary);
        assert!(line.starts_with("Hashnode"));
        assert!(line.contains("graphql"));
        assert!(line.ends_with("failed: timed out"));
    }
}
