//! Read-only projections of the GitHub repository object
//!
//! The search endpoint returns far more than a result card needs. These types keep
//! only the fields the view renders and tolerate missing fields, so a partial
//! object from the API never fails the whole page.

use serde::{Deserialize, Serialize};

/// Maximum number of topics shown in the detail view
pub const MAX_TOPICS: usize = 10;

/// One page of repository search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Repositories on this page, in the order GitHub ranked them
    #[serde(default)]
    pub items: Vec<RepoSummary>,

    /// Total number of matches reported by GitHub (not capped)
    #[serde(default)]
    pub total_count: u64,
}

/// Repository owner information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoOwner {
    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Fields of a repository needed to render a result card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Repository name (without owner)
    #[serde(default)]
    pub name: String,

    /// `owner/name`
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub owner: RepoOwner,

    /// Primary programming language
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub stargazers_count: u64,

    #[serde(default)]
    pub description: Option<String>,

    /// URL for viewing the repository in a browser
    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

impl RepoSummary {
    /// Description, or a placeholder when the repository has none
    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref() {
            Some(desc) if !desc.trim().is_empty() => desc,
            _ => "No description.",
        }
    }

    /// Language, or a dash when GitHub could not detect one
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or("—")
    }
}

/// Extended detail shown when the user opens one repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoDetail {
    pub repo: RepoSummary,
    pub topics: Vec<String>,
}

impl RepoDetail {
    /// Combines a card with the topics fetched for it, keeping at most [`MAX_TOPICS`]
    pub fn new(repo: RepoSummary, mut topics: Vec<String>) -> Self {
        topics.truncate(MAX_TOPICS);
        Self { repo, topics }
    }

    /// Modal title
    pub fn title(&self) -> &str {
        if self.repo.full_name.is_empty() {
            &self.repo.name
        } else {
            &self.repo.full_name
        }
    }
}

/// Body of `GET /repos/{owner}/{repo}/topics`
#[derive(Debug, Deserialize)]
pub(crate) struct TopicsResponse {
    #[serde(default)]
    pub names: Option<Vec<String>>,
}

/// Error body GitHub sends with non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Formats a count with thousands separators, as the cards display star counts
///
/// # Examples
///
/// ```
/// assert_eq!(gitscout::client::format_count(1234567), "1,234,567");
/// assert_eq!(gitscout::client::format_count(999), "999");
/// ```
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
