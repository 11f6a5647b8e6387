//! # Scoreline
//!
//! A command-line tracker for problem-solving progress on an online judge.
//!
//! ## Architecture
//!
//! ```text
//! Roster → Classifier → Aggregator → report
//!             ↑
//!      Store ← Resolver ← FetchScheduler
//! ```
//!
//! A roster file lists named groups of problem links with their locally
//! observed markers (solved / wrong on first try). Items the markers cannot
//! decide are resolved against the judge's per-problem status page through a
//! bounded-concurrency queue, with results cached persistently so repeated
//! passes stay off the network.
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration with commented defaults
//! - [`domain`]: Core domain models (ItemId, markers, cache entries)
//! - [`roster`]: Marker source abstraction and the roster-file implementation
//! - [`store`]: Versioned persistent cache over SQLite
//! - [`fetcher`]: HTTP lookups and the bounded FIFO scheduler
//! - [`resolver`]: Cache-or-fetch submission resolution
//! - [`classifier`]: Pure status derivation and threshold visibility
//! - [`aggregate`]: Per-group and global tallies with exclusion handling
//! - [`tracker`]: Engine wiring the above into refresh passes

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all
/// components: store, roster, resolver, tracker.
pub mod app;

/// Per-group and global tally computation.
pub mod aggregate;

/// Pure status derivation and threshold visibility.
pub mod classifier;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/scoreline/config.toml`, created with commented
/// defaults on first run.
pub mod config;

/// Core domain models.
///
/// - [`ItemId`](domain::ItemId): stable problem identifier parsed from a link
/// - [`ObservedMarker`](domain::ObservedMarker): directly observed flags
/// - [`CacheEntry`](domain::CacheEntry): cached lookup outcome
/// - [`ItemStatus`](domain::ItemStatus): derived four-state status
pub mod domain;

/// HTTP lookups and scheduling.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for page fetches
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`FetchScheduler`](fetcher::FetchScheduler): bounded FIFO task queue
pub mod fetcher;

/// Cache-or-fetch submission resolution.
pub mod resolver;

/// Marker source abstraction and the roster-file implementation.
pub mod roster;

/// Versioned persistent cache.
///
/// - [`Store`](store::Store): trait defining cache and preference operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Engine wiring roster, resolver, aggregator, and the lookup queues.
pub mod tracker;
