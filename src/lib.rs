//! gitscout: GitHub repository search with caching, deduplication and navigation state
//!
//! This library provides the coordination layer behind a repository search UI:
//! - Searching GitHub repositories (sorted by stars, paginated)
//! - Caching responses for a fixed time-to-live
//! - Sharing one network request among identical concurrent searches
//! - Cancelling superseded requests so a slow old answer never overwrites a new one
//! - Keeping query and page in step with an address history and a session store
//!
//! ## Authentication
//!
//! None. Every request is anonymous and no credential is ever attached, so the
//! unauthenticated rate limit applies:
//!
//! - 10 search requests per minute
//! - 60 core requests per hour (topic lookups)
//!
//! A 403 from the search endpoint surfaces as [`client::SearchError::RateLimited`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitscout::client::SearchClient;
//! use gitscout::config::{ClientConfig, NavigationConfig};
//! use gitscout::navigation::{MemoryHistory, MemorySessionStore, NavigationController};
//! use gitscout::view::TerminalView;
//!
//! # async fn run() {
//! let nav = NavigationController::new(
//!     Arc::new(SearchClient::new(ClientConfig::from_env())),
//!     Arc::new(TerminalView::new()),
//!     Arc::new(MemoryHistory::default()),
//!     Arc::new(MemorySessionStore::new()),
//!     NavigationConfig::default(),
//! );
//!
//! nav.start().await;
//! nav.set_query("language:rust async runtime").await;
//! nav.go_next().await;
//! # }
//! ```

pub mod client;
pub mod config;
pub mod navigation;
pub mod view;
