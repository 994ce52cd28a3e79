//! GitHub repository search client
//!
//! [`SearchClient`] answers repository searches through three layers, checked in
//! this order:
//!
//! 1. the [`ResponseCache`], which serves pages younger than the TTL,
//! 2. the [`InFlightRegistry`], which lets identical concurrent searches share one
//!    request,
//! 3. the network, where each new request first supersedes (cancels) whatever
//!    request the [`CancellationController`] still considers current.
//!
//! Requests are always unauthenticated; no credential is ever attached.
//!
//! ```no_run
//! use gitscout::client::SearchClient;
//! use gitscout::config::ClientConfig;
//!
//! # async fn run() {
//! let client = SearchClient::new(ClientConfig::default());
//! match client.search("language:rust", 1, 10).await {
//!     Ok(page) => println!("{} repositories", page.total_count),
//!     Err(e) if e.is_cancelled() => {}
//!     Err(e) => eprintln!("search failed: {}", e),
//! }
//! # }
//! ```

pub mod cache;
pub mod cancellation;
pub mod error;
pub mod inflight;
pub mod models;
pub mod params;
pub mod transport;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use cache::{CacheStats, ResponseCache};
pub use cancellation::{CancelTicket, CancellationController};
pub use error::{SearchError, TransportError};
pub use inflight::{InFlightRegistry, SearchOutcome};
pub use models::{RepoDetail, RepoOwner, RepoSummary, SearchPage, format_count};
pub use params::{DEFAULT_QUERY, OrderOption, RequestSignature, SortOption};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

use crate::config::ClientConfig;
use error::GENERIC_NETWORK_ERROR;
use models::{ApiErrorBody, MAX_TOPICS, TopicsResponse};

/// Search client owning the cache, the in-flight registry and the active request
///
/// Construct one per session and share it by reference (or `Arc`); all the state
/// that makes deduplication and supersession work lives in this instance.
pub struct SearchClient {
    transport: Arc<dyn HttpTransport>,
    config: ClientConfig,
    cache: Arc<ResponseCache>,
    inflight: InFlightRegistry,
    cancellation: Arc<CancellationController>,
}

impl SearchClient {
    /// Creates a client that talks to the API through `reqwest`
    pub fn new(config: ClientConfig) -> Self {
        let transport = ReqwestTransport::new(Client::new(), config.user_agent.clone());
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client on top of a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            inflight: InFlightRegistry::new(),
            cancellation: Arc::new(CancellationController::new()),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Search repositories, sorted by stars in descending order
    ///
    /// An empty or whitespace-only `query` searches [`DEFAULT_QUERY`].
    ///
    /// # Errors
    ///
    /// - [`SearchError::RateLimited`] when GitHub answers 403
    /// - [`SearchError::Remote`] for other non-2xx answers
    /// - [`SearchError::Cancelled`] when a newer search superseded this one; callers
    ///   should drop the result silently
    /// - [`SearchError::NetworkFailure`] when no usable response arrived
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, SearchError> {
        let signature = RequestSignature::new(query, page, per_page);

        if let Some(cached) = self.cache.get(&signature) {
            tracing::debug!("Returning cached search result for {}", signature);
            return Ok(cached);
        }

        let shared = self
            .inflight
            .get_or_create(&signature, || self.dispatch(signature.clone()));
        shared.await
    }

    /// Issues the network request for `signature` under a fresh cancellation ticket
    ///
    /// The ticket is taken immediately, so the previous request is cancelled at
    /// dispatch time rather than when the returned future is first polled. The
    /// ticket's token is returned with the future so the registry can tell a
    /// cancelled registration from a live one.
    fn dispatch(
        &self,
        signature: RequestSignature,
    ) -> (CancellationToken, BoxFuture<'static, SearchOutcome>) {
        let ticket = self.cancellation.start_new();
        let token = ticket.token().clone();
        let url = signature.search_url(&self.config.api_base);
        let transport = self.transport.clone();
        let cache = self.cache.clone();
        let cancellation = self.cancellation.clone();

        let request = async move {
            tracing::info!("Searching repositories: {}", signature);

            let result = tokio::select! {
                biased;
                _ = ticket.token().cancelled() => Err(SearchError::Cancelled),
                response = transport.get(&url) => classify_search_response(response),
            };
            cancellation.release(&ticket);

            match &result {
                Ok(page) => cache.put(signature, page.clone()),
                Err(SearchError::Cancelled) => {
                    tracing::debug!("Search superseded: {}", signature)
                }
                Err(e) => tracing::warn!("Search failed for {}: {}", signature, e),
            }
            result
        }
        .boxed();
        (token, request)
    }

    /// Fetch up to 10 topics of `owner/repo`
    ///
    /// Best-effort: any failure yields an empty list.
    pub async fn fetch_supplementary_detail(
        &self,
        owner_login: &str,
        repo_name: &str,
    ) -> Vec<String> {
        let url = params::topics_url(&self.config.api_base, owner_login, repo_name);

        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Topics request for {}/{} failed: {}", owner_login, repo_name, e);
                return vec![];
            }
        };

        if !response.is_success() {
            tracing::debug!(
                "Topics request for {}/{} returned {}",
                owner_login,
                repo_name,
                response.status
            );
            return vec![];
        }

        match serde_json::from_slice::<TopicsResponse>(&response.body) {
            Ok(TopicsResponse { names: Some(mut names) }) => {
                names.truncate(MAX_TOPICS);
                names
            }
            Ok(_) => vec![],
            Err(e) => {
                tracing::debug!("Malformed topics body for {}/{}: {}", owner_login, repo_name, e);
                vec![]
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of searches currently on the wire
    pub fn pending_requests(&self) -> usize {
        self.inflight.pending()
    }

    /// Cancels the outstanding network request, if any
    pub fn cancel_outstanding(&self) {
        self.cancellation.cancel_all();
    }
}

/// Maps a transport result onto a search page or a [`SearchError`]
fn classify_search_response(
    response: Result<HttpResponse, TransportError>,
) -> Result<SearchPage, SearchError> {
    let response = response.map_err(|e| SearchError::NetworkFailure(e.to_string()))?;

    if response.status == 403 {
        return Err(SearchError::RateLimited);
    }

    if !response.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_NETWORK_ERROR.to_string());
        return Err(SearchError::Remote(message));
    }

    serde_json::from_slice::<SearchPage>(&response.body)
        .map_err(|e| SearchError::NetworkFailure(format!("Failed to parse GitHub response: {}", e)))
}
