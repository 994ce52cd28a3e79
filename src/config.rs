//! Runtime configuration
//!
//! Defaults match the public GitHub API. Each value can be overridden through the
//! environment, and the CLI layers its own flags on top.
//!
//! ```bash
//! export GITSCOUT_API_BASE=https://api.github.com
//! export GITSCOUT_PER_PAGE=10
//! export GITSCOUT_CACHE_TTL_SECS=120
//! ```

use std::time::Duration;
use url::Url;

use crate::client::cache::DEFAULT_CACHE_TTL;
use crate::client::params::MAX_PER_PAGE;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u8 = 10;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

pub const ENV_API_BASE: &str = "GITSCOUT_API_BASE";
pub const ENV_PER_PAGE: &str = "GITSCOUT_PER_PAGE";
pub const ENV_CACHE_TTL_SECS: &str = "GITSCOUT_CACHE_TTL_SECS";

/// Settings of the [`SearchClient`](crate::client::SearchClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the REST API; tests point this at a mock server
    pub api_base: Url,
    pub per_page: u8,
    pub cache_ttl: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            per_page: DEFAULT_PER_PAGE,
            cache_ttl: DEFAULT_CACHE_TTL,
            user_agent: format!(
                "gitscout/{} (https://github.com/tacogips/gitscout)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("DEFAULT_API_BASE is a valid URL")
}

impl ClientConfig {
    /// Defaults overlaid with the `GITSCOUT_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_API_BASE) {
            match Url::parse(&raw) {
                Ok(url) => self.api_base = url,
                Err(e) => tracing::warn!("Ignoring {}={}: {}", ENV_API_BASE, raw, e),
            }
        }

        if let Some(raw) = lookup(ENV_PER_PAGE) {
            match raw.trim().parse::<u8>() {
                Ok(n) if (1..=MAX_PER_PAGE).contains(&n) => self.per_page = n,
                _ => tracing::warn!("Ignoring {}={}: expected 1..=100", ENV_PER_PAGE, raw),
            }
        }

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.cache_ttl = Duration::from_secs(secs),
                Err(e) => tracing::warn!("Ignoring {}={}: {}", ENV_CACHE_TTL_SECS, raw, e),
            }
        }

        self
    }
}

/// Settings of the [`NavigationController`](crate::navigation::NavigationController)
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Delay between the last keystroke and the search it triggers
    pub debounce: Duration,
    pub per_page: u8,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}
