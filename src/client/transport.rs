//! HTTP seam of the search client
//!
//! The client never talks to `reqwest` directly. It goes through [`HttpTransport`],
//! which lets tests substitute a transport that holds responses back until told to
//! release them.

use async_trait::async_trait;
use reqwest::Client;

use super::error::TransportError;

/// Media type GitHub recommends for REST calls
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// REST API version pinned for every request
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Status and raw body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs GET requests against the GitHub API
///
/// Implementations must not attach any credential. Dropping the returned future
/// must abort the request; the client relies on that for cancellation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        // GitHub rejects requests without a User-Agent
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}
