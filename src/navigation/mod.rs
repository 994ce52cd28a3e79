//! Navigation state
//!
//! [`NavigationController`] owns the query, the page and the number of reachable
//! pages. It keeps them in step with the address [`History`] and the
//! [`SessionStore`], drives the [`SearchClient`], and tells the [`View`] what to
//! render.
//!
//! Every load gets a generation number. When a newer load starts before an older
//! one settles, the older one's result is discarded on resumption, whether it
//! arrives as `Cancelled` or as a late success.

pub mod debounce;
pub mod history;
pub mod storage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::params::{DEFAULT_QUERY, normalize_query, total_pages};
use crate::client::{RepoDetail, RepoSummary, SearchClient, SearchError};
use crate::config::NavigationConfig;
use crate::view::{Pagination, StatusTone, View};

pub use debounce::Debouncer;
pub use history::{AddressState, History, MemoryHistory, format_address, parse_address};
pub use storage::{
    FileSessionStore, MemorySessionStore, SESSION_PAGE_KEY, SESSION_QUERY_KEY, SessionStore,
    StorageError,
};

pub const STATUS_LOADING: &str = "Loading…";
pub const STATUS_NO_RESULTS: &str = "No results.";
pub const STATUS_RATE_LIMITED: &str = "GitHub API rate limit reached. Try again later.";

/// Query, page and page count as currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// Never empty; [`DEFAULT_QUERY`] when the user has not typed anything
    pub query: String,
    /// 1-based
    pub page: u32,
    /// At least 1
    pub total_pages: u32,
    pub loading: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            page: 1,
            total_pages: 1,
            loading: false,
        }
    }
}

/// What a finished load does to the address history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Add a new entry (user-initiated navigation)
    Push,
    /// Overwrite the current entry (initial load)
    Replace,
    /// Leave history alone (the load was triggered by history navigation)
    Skip,
}

#[derive(Debug, Default)]
struct Inner {
    state: SearchState,
    generation: u64,
    /// `{query, page}` of the load in flight
    target: Option<(String, u32)>,
    results: Vec<RepoSummary>,
}

/// Coordinates search state, persistence and rendering
pub struct NavigationController {
    client: Arc<SearchClient>,
    view: Arc<dyn View>,
    history: Arc<dyn History>,
    session: Arc<dyn SessionStore>,
    config: NavigationConfig,
    inner: Mutex<Inner>,
    debouncer: Debouncer,
}

impl NavigationController {
    pub fn new(
        client: Arc<SearchClient>,
        view: Arc<dyn View>,
        history: Arc<dyn History>,
        session: Arc<dyn SessionStore>,
        config: NavigationConfig,
    ) -> Self {
        Self {
            client,
            view,
            history,
            session,
            debouncer: Debouncer::new(config.debounce),
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SearchState {
        self.lock().state.clone()
    }

    /// Repositories of the last successful load
    pub fn results(&self) -> Vec<RepoSummary> {
        self.lock().results.clone()
    }

    pub fn client(&self) -> &SearchClient {
        &self.client
    }

    /// Restores `{query, page}` from the address, or from the session store when
    /// the address carries no navigation parameter
    ///
    /// Does not load anything.
    pub fn hydrate(&self) {
        let address = parse_address(&self.history.current());

        let (query, page, source) = if !address.is_empty() {
            (address.query_or_default(), address.page_or_default(), "address")
        } else {
            let query = self
                .session
                .get(SESSION_QUERY_KEY)
                .map(|q| normalize_query(&q))
                .unwrap_or_else(|| DEFAULT_QUERY.to_string());
            let page = self
                .session
                .get(SESSION_PAGE_KEY)
                .and_then(|p| p.trim().parse::<u32>().ok())
                .filter(|p| *p > 0)
                .unwrap_or(1);
            (query, page, "session")
        };

        tracing::debug!("Hydrated query={:?} page={} from {}", query, page, source);
        let mut inner = self.lock();
        inner.state.query = query;
        inner.state.page = page;
    }

    /// Hydrates and performs the first load, overwriting the current address
    pub async fn start(&self) {
        self.hydrate();
        self.load(HistoryUpdate::Replace).await;
    }

    /// Searches `text` from page 1 right away
    pub async fn set_query(&self, text: &str) {
        {
            let mut inner = self.lock();
            inner.state.query = normalize_query(text);
            inner.state.page = 1;
        }
        self.load(HistoryUpdate::Push).await;
    }

    /// Searches `text` once input has been idle for the debounce delay
    ///
    /// A call made before the previous timer fired replaces it.
    pub fn schedule_query(self: &Arc<Self>, text: &str) {
        let controller = Arc::clone(self);
        let text = text.to_string();
        self.debouncer.schedule(async move {
            controller.set_query(&text).await;
        });
    }

    /// Loads `page` of `query` in one step
    pub async fn navigate(&self, query: &str, page: u32) {
        {
            let mut inner = self.lock();
            inner.state.query = normalize_query(query);
            inner.state.page = page.max(1);
        }
        self.load(HistoryUpdate::Push).await;
    }

    /// Goes back to the default query, unless it is already shown
    pub async fn clear_query(&self) {
        {
            let mut inner = self.lock();
            if inner.state.query == DEFAULT_QUERY {
                return;
            }
            inner.state.query = DEFAULT_QUERY.to_string();
            inner.state.page = 1;
        }
        self.load(HistoryUpdate::Push).await;
    }

    /// Loads page `n` (at least 1) of the current query
    pub async fn set_page(&self, n: u32) {
        self.lock().state.page = n.max(1);
        self.load(HistoryUpdate::Push).await;
    }

    /// Loads the previous page; returns `false` without loading on page 1
    pub async fn go_prev(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.state.page <= 1 {
                return false;
            }
            inner.state.page -= 1;
        }
        self.load(HistoryUpdate::Push).await;
        true
    }

    /// Loads the next page; returns `false` without loading on the last page
    pub async fn go_next(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.state.page >= inner.state.total_pages {
                return false;
            }
            inner.state.page += 1;
        }
        self.load(HistoryUpdate::Push).await;
        true
    }

    /// Applies the address the history moved to and loads it
    ///
    /// The address is the only source: a missing `q` means the default query and
    /// a missing `page` means page 1.
    pub async fn on_history_navigated(&self, address: &str) {
        let parsed = parse_address(address);
        {
            let mut inner = self.lock();
            inner.state.query = parsed.query_or_default();
            inner.state.page = parsed.page_or_default();
        }
        self.load(HistoryUpdate::Skip).await;
    }

    /// Moves the history back one entry; returns `false` at the oldest entry
    pub async fn go_back(&self) -> bool {
        match self.history.back() {
            Some(address) => {
                self.on_history_navigated(&address).await;
                true
            }
            None => false,
        }
    }

    /// Moves the history forward one entry; returns `false` at the newest entry
    pub async fn go_forward(&self) -> bool {
        match self.history.forward() {
            Some(address) => {
                self.on_history_navigated(&address).await;
                true
            }
            None => false,
        }
    }

    /// Opens the detail view of `repo`
    ///
    /// Topics are fetched best-effort; without them the view still opens with the
    /// card's own information.
    pub async fn open_detail(&self, repo: &RepoSummary) -> RepoDetail {
        let topics = self
            .client
            .fetch_supplementary_detail(&repo.owner.login, &repo.name)
            .await;
        let detail = RepoDetail::new(repo.clone(), topics);
        self.view.open_modal(&detail);
        detail
    }

    /// Searches the current `{query, page}` and renders the outcome
    ///
    /// While a load for the same target is in flight this is a no-op. A load for a
    /// different target supersedes the one in flight.
    pub async fn load(&self, history: HistoryUpdate) {
        let per_page = self.config.per_page;

        let (generation, query, page) = {
            let mut inner = self.lock();
            let target = (inner.state.query.clone(), inner.state.page);
            if inner.state.loading && inner.target.as_ref() == Some(&target) {
                tracing::debug!("Load of {:?} page {} already in flight", target.0, target.1);
                return;
            }
            inner.generation += 1;
            inner.state.loading = true;
            inner.target = Some(target.clone());
            (inner.generation, target.0, target.1)
        };

        self.view.set_status(STATUS_LOADING, StatusTone::Neutral, true);
        self.view.clear_cards();
        self.view.render_skeletons(usize::from(per_page));

        let outcome = self.client.search(&query, page, per_page).await;

        {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::debug!("Discarding stale result for {:?} page {}", query, page);
                return;
            }
            inner.state.loading = false;
            inner.target = None;

            match &outcome {
                Ok(result) => {
                    inner.state.total_pages = total_pages(result.total_count, per_page);
                    inner.results = result.items.clone();
                }
                Err(SearchError::Cancelled) => {}
                Err(_) => {
                    // Match the "1 of 1" pagination the error view shows
                    inner.state.page = 1;
                    inner.state.total_pages = 1;
                    inner.results.clear();
                }
            }
        }

        match outcome {
            Ok(result) => {
                let total = self.lock().state.total_pages;
                self.render_results(&result.items, page, total);
                self.persist(&query, page, history);
            }
            Err(SearchError::Cancelled) => {
                tracing::debug!("Load of {:?} page {} was superseded", query, page);
            }
            Err(e) => self.render_error(&e),
        }
    }

    fn render_results(&self, items: &[RepoSummary], page: u32, total_pages: u32) {
        if items.is_empty() {
            self.view.render_cards(&[]);
            self.view.update_pagination(Pagination::new(1, 1));
            self.view
                .set_status(STATUS_NO_RESULTS, StatusTone::Muted, false);
        } else {
            self.view.render_cards(items);
            self.view
                .update_pagination(Pagination::new(page, total_pages));
            self.view.set_status(
                &format!("{} results, page {} of {}", items.len(), page, total_pages),
                StatusTone::Neutral,
                false,
            );
        }
    }

    fn render_error(&self, error: &SearchError) {
        let message = match error {
            SearchError::RateLimited => STATUS_RATE_LIMITED.to_string(),
            other => format!("An error occurred: {}", other),
        };
        self.view.set_status(&message, StatusTone::Error, false);
        self.view.clear_cards();
        self.view.render_cards(&[]);
        self.view.update_pagination(Pagination::new(1, 1));
    }

    /// Mirrors `{query, page}` into the session store and the address history
    fn persist(&self, query: &str, page: u32, history: HistoryUpdate) {
        let entries = [
            (SESSION_QUERY_KEY, query.to_string()),
            (SESSION_PAGE_KEY, page.to_string()),
        ];
        for (key, value) in entries {
            if let Err(e) = self.session.set(key, &value) {
                tracing::warn!("Failed to persist {} to session: {}", key, e);
            }
        }

        let address = format_address(query, page);
        match history {
            HistoryUpdate::Push => self.history.push(&address),
            HistoryUpdate::Replace => self.history.replace(&address),
            HistoryUpdate::Skip => {}
        }
    }

    /// Drops the pending debounced query and cancels the outstanding request
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        self.client.cancel_outstanding();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HttpResponse, HttpTransport, TransportError};
    use crate::config::ClientConfig;
    use crate::view::RecordingView;
    use async_trait::async_trait;

    const EMPTY_PAGE: &str = r#"{"total_count":0,"items":[]}"#;

    /// Transport that answers every search with the same body
    struct FixedTransport(String);

    #[async_trait]
    impl HttpTransport for FixedTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 200,
                body: self.0.as_bytes().to_vec(),
            })
        }
    }

    fn controller(
        body: &str,
        history: Arc<MemoryHistory>,
        session: Arc<MemorySessionStore>,
    ) -> (NavigationController, Arc<RecordingView>) {
        let client = Arc::new(SearchClient::with_transport(
            ClientConfig::default(),
            Arc::new(FixedTransport(body.to_string())),
        ));
        let view = Arc::new(RecordingView::new());
        let nav = NavigationController::new(
            client,
            view.clone(),
            history,
            session,
            NavigationConfig::default(),
        );
        (nav, view)
    }

    #[test]
    fn test_hydrate_prefers_address() {
        let history = Arc::new(MemoryHistory::new("q=from-url&page=3"));
        let session = Arc::new(MemorySessionStore::with_entries([
            (SESSION_QUERY_KEY, "from-session"),
            (SESSION_PAGE_KEY, "7"),
        ]));
        let (nav, _) = controller("{}", history, session);

        nav.hydrate();
        let state = nav.state();
        assert_eq!(state.query, "from-url");
        assert_eq!(state.page, 3);
    }

    #[test]
    fn test_hydrate_falls_back_to_session() {
        let history = Arc::new(MemoryHistory::new(""));
        let session = Arc::new(MemorySessionStore::with_entries([
            (SESSION_QUERY_KEY, "from-session"),
            (SESSION_PAGE_KEY, "7"),
        ]));
        let (nav, _) = controller("{}", history, session);

        nav.hydrate();
        assert_eq!(nav.state().query, "from-session");
        assert_eq!(nav.state().page, 7);
    }

    #[test]
    fn test_hydrate_rejects_invalid_session_values() {
        let history = Arc::new(MemoryHistory::new(""));
        let session = Arc::new(MemorySessionStore::with_entries([
            (SESSION_QUERY_KEY, "   "),
            (SESSION_PAGE_KEY, "-2"),
        ]));
        let (nav, _) = controller("{}", history, session);

        nav.hydrate();
        assert_eq!(nav.state(), SearchState::default());
    }

    #[tokio::test]
    async fn test_empty_results_render_muted_status() {
        let history = Arc::new(MemoryHistory::new(""));
        let session = Arc::new(MemorySessionStore::new());
        let (nav, view) = controller(EMPTY_PAGE, history.clone(), session.clone());

        nav.set_query("nothing-matches-this").await;

        assert_eq!(
            view.last_status(),
            Some((STATUS_NO_RESULTS.to_string(), StatusTone::Muted, false))
        );
        assert_eq!(view.last_pagination(), Some(Pagination::new(1, 1)));
        assert_eq!(view.last_cards(), Some(vec![]));
        assert_eq!(nav.state().total_pages, 1);
        assert!(!nav.state().loading);
        assert_eq!(history.current(), "q=nothing-matches-this&page=1");
        assert_eq!(session.get(SESSION_QUERY_KEY).as_deref(), Some("nothing-matches-this"));
    }

    #[tokio::test]
    async fn test_clear_query_is_noop_on_default() {
        let history = Arc::new(MemoryHistory::new(""));
        let (nav, view) = controller(EMPTY_PAGE, history, Arc::new(MemorySessionStore::new()));

        nav.clear_query().await;
        assert!(view.events().is_empty());

        nav.set_query("serde").await;
        view.clear();
        nav.clear_query().await;
        assert_eq!(nav.state().query, DEFAULT_QUERY);
        assert!(!view.events().is_empty());
    }

    #[tokio::test]
    async fn test_initial_load_replaces_current_address() {
        let history = Arc::new(MemoryHistory::new("q=tokio"));
        let (nav, _) = controller(EMPTY_PAGE, history.clone(), Arc::new(MemorySessionStore::new()));

        nav.start().await;
        assert_eq!(history.addresses(), vec!["q=tokio&page=1"]);
    }
}
