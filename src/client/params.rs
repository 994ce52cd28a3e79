//! Request parameters for the GitHub repository search endpoint
//!
//! Every search is reduced to a [`RequestSignature`] before it touches the cache,
//! the in-flight registry, or the network. Building the signature is where input
//! normalization happens, so two logically identical requests always compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

/// Query used when the user has not typed anything
///
/// GitHub rejects an empty `q`, so an empty search is mapped to the most-starred
/// repositories instead.
pub const DEFAULT_QUERY: &str = "stars:>10000";

/// GitHub never serves more than this many results for one search, whatever
/// `total_count` reports.
pub const SEARCH_RESULT_WINDOW: u64 = 1000;

/// Largest page size the search API accepts
pub const MAX_PER_PAGE: u8 = 100;

/// Sort key sent with every search
///
/// Results are always ranked by stars; the key is still part of the
/// [`RequestSignature`] so the query string is built from one place.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SortOption {
    /// Sort by number of stars (popularity)
    #[default]
    #[strum(serialize = "stars")]
    Stars,
}

impl SortOption {
    /// Converts the sort option to its API string representation
    pub fn to_str(&self) -> &str {
        self.as_ref()
    }
}

/// Sort direction sent with every search
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum OrderOption {
    #[default]
    #[strum(serialize = "desc")]
    Descending,
}

impl OrderOption {
    /// Converts the order option to its API string representation
    pub fn to_str(&self) -> &str {
        self.as_ref()
    }
}

/// Returns the trimmed query, or [`DEFAULT_QUERY`] when nothing is left after trimming
pub fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Canonical identity of one repository search request
///
/// Used as the key of both the response cache and the in-flight registry.
/// Construct it through [`RequestSignature::new`] so the query is normalized and
/// the page numbers are kept inside what the API accepts.
///
/// # Examples
///
/// ```
/// use gitscout::client::RequestSignature;
///
/// let a = RequestSignature::new("  rust ", 1, 10);
/// let b = RequestSignature::new("rust", 1, 10);
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "q=rust&sort=stars&order=desc&per_page=10&page=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestSignature {
    pub query: String,
    pub page: u32,
    pub per_page: u8,
    pub sort: SortOption,
    pub order: OrderOption,
}

impl RequestSignature {
    /// Builds the signature of a stars-descending search
    ///
    /// `page` is raised to at least 1 and `per_page` is clamped to `1..=100`.
    pub fn new(query: &str, page: u32, per_page: u8) -> Self {
        Self {
            query: normalize_query(query),
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            sort: SortOption::default(),
            order: OrderOption::default(),
        }
    }

    /// Constructs the full repository search URL below `api_base`
    pub fn search_url(&self, api_base: &url::Url) -> String {
        format!(
            "{}/search/repositories?{}",
            api_base.as_str().trim_end_matches('/'),
            self
        )
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q={}&sort={}&order={}&per_page={}&page={}",
            urlencoding::encode(&self.query),
            self.sort.to_str(),
            self.order.to_str(),
            self.per_page,
            self.page
        )
    }
}

/// Constructs the topics URL for one repository
///
/// Both path segments are percent-encoded so owner or repository names can never
/// escape their segment.
pub fn topics_url(api_base: &url::Url, owner: &str, repo: &str) -> String {
    format!(
        "{}/repos/{}/{}/topics",
        api_base.as_str().trim_end_matches('/'),
        urlencoding::encode(owner),
        urlencoding::encode(repo)
    )
}

/// Number of pages reachable for a search that reported `total_count` matches
///
/// The count is capped at the API's result window before dividing, and the
/// result is never below 1.
pub fn total_pages(total_count: u64, per_page: u8) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let reachable = total_count.min(SEARCH_RESULT_WINDOW);
    let pages = reachable.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
