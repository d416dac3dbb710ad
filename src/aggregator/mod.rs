//! Fan-out over every registered source, merge, and serve from cache.
//!
//! ```text
//! get_posts ─┬─ fresh entry ───────────────────────────────▶ cached batch
//!            └─ stale/missing ─▶ refresh cycle ─▶ cache.put ─▶ new batch
//!
//! refresh cycle: spawn one task per source ─▶ join all ─▶ concat
//!                ─▶ dedupe ids ─▶ stable sort by created_at desc ─▶ truncate
//! ```
//!
//! Refresh cycles are serialized: callers racing on a stale entry wait for
//! the in-flight cycle and reuse its result instead of fanning out again.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::adapter::{AdapterSet, FetchOutcome};
use crate::app::{Result, TributaryError};
use crate::cache::{CacheEntry, CacheScope, TimedCache};
use crate::config::AggregatorConfig;
use crate::domain::{AdapterKind, CanonicalPost};
use crate::registry::SourceRegistry;

const SCOPE: CacheScope = CacheScope::AllSources;

/// Result of one refresh cycle.
#[derive(Debug, Default)]
pub struct Batch {
    pub posts: Vec<CanonicalPost>,
    pub reports: Vec<SourceReport>,
}

/// How a single source fared during a refresh cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub source: String,
    pub ok: bool,
    /// Posts the source returned, before merging and truncation
    pub fetched: usize,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// A registry entry with its share of the current batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub name: String,
    pub site_url: String,
    pub logo: String,
    pub kind: AdapterKind,
    pub count: usize,
    pub last_report: Option<SourceReport>,
}

pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    adapters: AdapterSet,
    cache: TimedCache<CacheScope, Batch>,
    config: AggregatorConfig,
    refresh_lock: Mutex<()>,
    cycles: AtomicU64,
}

impl Aggregator {
    pub fn new(registry: SourceRegistry, adapters: AdapterSet, config: AggregatorConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            adapters,
            cache: TimedCache::new(),
            config,
            refresh_lock: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Most recent posts across all sources. Never fails; an empty list
    /// means no source produced anything.
    pub async fn get_posts(&self) -> Vec<CanonicalPost> {
        self.current_batch().await.posts.clone()
    }

    /// Drop the cached batch and fetch a new one, regardless of freshness.
    pub async fn refresh(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.cache.invalidate(&SCOPE);
        if let Err(e) = self.run_cycle().await {
            error!("Refresh failed: {}", e);
        }
    }

    /// Posts from one source, matched case-insensitively by name.
    pub async fn posts_from(&self, source: &str) -> Vec<CanonicalPost> {
        let source = source.trim();
        self.current_batch()
            .await
            .posts
            .iter()
            .filter(|p| p.source.eq_ignore_ascii_case(source))
            .cloned()
            .collect()
    }

    /// Every registered source in registry order, with post counts from the
    /// current batch.
    pub async fn source_summaries(&self) -> Vec<SourceSummary> {
        let batch = self.current_batch().await;
        self.registry
            .iter()
            .map(|source| SourceSummary {
                name: source.name.clone(),
                site_url: source.site_url.clone(),
                logo: source.logo.clone(),
                kind: source.kind,
                count: batch.posts.iter().filter(|p| p.source == source.name).count(),
                last_report: batch
                    .reports
                    .iter()
                    .find(|r| r.source == source.name)
                    .cloned(),
            })
            .collect()
    }

    /// Cached entry without triggering a fetch.
    pub fn snapshot(&self) -> Option<CacheEntry<Batch>> {
        self.cache.get(&SCOPE)
    }

    /// Number of refresh cycles started since construction.
    pub fn cycles_run(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    async fn current_batch(&self) -> Arc<Batch> {
        if let Some(entry) = self.fresh_entry() {
            debug!(fetched_at = %entry.fetched_at, "serving cached posts");
            return entry.value;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(entry) = self.fresh_entry() {
            return entry.value;
        }

        match self.run_cycle().await {
            Ok(entry) => entry.value,
            Err(e) => self.last_good(&e),
        }
    }

    /// Batch served when a cycle task aborts: whatever is cached, however
    /// stale, else nothing. Per-source panics never get here; `fan_out`
    /// contains them.
    fn last_good(&self, cause: &TributaryError) -> Arc<Batch> {
        error!("Refresh failed, serving last good posts: {}", cause);
        self.cache.get(&SCOPE).map(|e| e.value).unwrap_or_default()
    }

    fn fresh_entry(&self) -> Option<CacheEntry<Batch>> {
        let entry = self.cache.get(&SCOPE)?;
        let age = entry.age(Utc::now()).to_std().unwrap_or(Duration::ZERO);
        (age < self.config.freshness()).then_some(entry)
    }

    /// Run one fan-out and store its batch. Callers hold `refresh_lock`.
    async fn run_cycle(&self) -> Result<CacheEntry<Batch>> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        let started = Instant::now();

        let batch = tokio::spawn(fan_out(
            self.registry.clone(),
            self.adapters.clone(),
            self.config.adapter_timeout(),
            self.config.max_posts,
        ))
        .await
        .map_err(|e| TributaryError::Other(format!("refresh cycle aborted: {}", e)))?;

        let failed = batch.reports.iter().filter(|r| !r.ok).count();
        if failed == batch.reports.len() && !batch.reports.is_empty() {
            warn!(cycle, "every source failed; caching an empty batch");
        }
        info!(
            cycle,
            posts = batch.posts.len(),
            sources = batch.reports.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "refresh cycle complete"
        );

        Ok(self.cache.put(SCOPE, batch, started_at))
    }
}

/// Fetch every source concurrently and merge what succeeded.
async fn fan_out(
    registry: Arc<SourceRegistry>,
    adapters: AdapterSet,
    timeout: Duration,
    max_posts: usize,
) -> Batch {
    let handles: Vec<_> = registry
        .iter()
        .map(|source| {
            let adapters = adapters.clone();
            let source = source.clone();
            tokio::spawn(async move {
                let started = Instant::now();
                let outcome = adapters.fetch(&source, timeout).await;
                (outcome, started.elapsed())
            })
        })
        .collect();

    let joined = join_all(handles).await;

    let mut outputs = Vec::with_capacity(joined.len());
    let mut reports = Vec::with_capacity(joined.len());
    for (source, result) in registry.iter().zip(joined) {
        let (outcome, elapsed) = match result {
            Ok(done) => done,
            Err(e) => {
                error!(source = %source.name, "source task join error: {}", e);
                (FetchOutcome::Failed(format!("task failed: {}", e)), Duration::ZERO)
            }
        };

        reports.push(SourceReport {
            source: source.name.clone(),
            ok: outcome.is_ok(),
            fetched: match &outcome {
                FetchOutcome::Fetched(posts) => posts.len(),
                FetchOutcome::Failed(_) => 0,
            },
            error: outcome.failure().map(str::to_string),
            elapsed_ms: elapsed.as_millis() as u64,
        });
        outputs.push(outcome.into_posts());
    }

    Batch {
        posts: merge(outputs, max_posts),
        reports,
    }
}

/// Concatenate per-source outputs in order, drop duplicate ids (first wins)
/// and records without an origin link, stable-sort newest first, truncate.
pub fn merge(outputs: Vec<Vec<CanonicalPost>>, max_posts: usize) -> Vec<CanonicalPost> {
    let mut seen = HashSet::new();
    let mut posts: Vec<CanonicalPost> = outputs
        .into_iter()
        .flatten()
        .filter(|post| {
            if !post.has_valid_origin() {
                warn!(id = %post.id, "dropping external post without original url");
                return false;
            }
            if !seen.insert(post.id.clone()) {
                debug!(id = %post.id, "dropping duplicate post id");
                return false;
            }
            true
        })
        .collect();

    // sort_by is stable: equal timestamps keep source order
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(max_posts);
    posts
}
