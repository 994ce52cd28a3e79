use thiserror::Error;

/// Message used when a failed response carries no readable `message`
pub const GENERIC_NETWORK_ERROR: &str = "Network error";

/// Ways a repository search can fail
///
/// The type is `Clone` because one in-flight request may be awaited by several
/// callers and each of them receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// GitHub answered 403: the unauthenticated rate limit is exhausted
    #[error("GitHub API rate limit reached")]
    RateLimited,

    /// Any other non-2xx answer, with the message GitHub sent back
    #[error("{0}")]
    Remote(String),

    /// A newer request superseded this one. Never shown to the user.
    #[error("request was superseded")]
    Cancelled,

    /// The request did not produce a usable response
    #[error("network failure: {0}")]
    NetworkFailure(String),
}

impl SearchError {
    /// Whether the error means "a newer request won", which callers ignore
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

/// Failure raised by an [`HttpTransport`](super::transport::HttpTransport)
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError(e.to_string())
    }
}
