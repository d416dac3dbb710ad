//! # Tributary
//!
//! Aggregates recent posts from external blogging platforms into one
//! canonical, time-ordered feed.
//!
//! ## Architecture
//!
//! ```text
//! Registry → Adapters (concurrent) → Merge → Cache → HTTP / CLI
//! ```
//!
//! - [`registry`]: Ordered list of configured sources
//! - [`adapter`]: REST-JSON, GraphQL and RSS-via-proxy source adapters
//! - [`aggregator`]: Fan-out, merge and cached reads
//! - [`server`]: JSON endpoints for the front-end
//!
//! ## Quick Start
//!
//! ```bash
//! # Print the merged feed
//! tributary posts
//!
//! # Only one source, as JSON
//! tributary posts --source hashnode --json
//!
//! # Serve on 127.0.0.1:8080
//! tributary serve
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the HTTP
/// client, the source registry and the shared aggregator.
pub mod app;

/// Configuration loaded from `~/.config/tributary/config.toml`.
pub mod config;

/// Command-line interface using clap.
///
/// - `posts [--source NAME] [--limit N] [--json]` - Print the merged feed
/// - `sources` - List sources with post counts
/// - `serve [--addr ADDR]` - Run the HTTP server
pub mod cli;

/// Core domain models.
///
/// - [`CanonicalPost`](domain::CanonicalPost): Provider-independent post
/// - [`SourceDescriptor`](domain::SourceDescriptor): A configured source
pub mod domain;

/// Text helpers shared by the adapters: tag stripping, excerpts, slugs,
/// read-time estimates and timestamp parsing.
pub mod normalizer;

/// HTTP transport.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for GET and JSON POST
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Per-protocol source adapters behind the
/// [`SourceAdapter`](adapter::SourceAdapter) trait.
pub mod adapter;

pub mod registry;

/// Time-stamped in-memory cache.
pub mod cache;

/// Concurrent fan-out, merge and freshness-window caching.
pub mod aggregator;

/// axum router exposing posts, sources and manual refresh.
pub mod server;
