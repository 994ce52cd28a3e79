//! Tests for NavigationController driving a SearchClient over a scripted transport
//!
//! These tests verify:
//! 1. Status lines, cards and pagination rendered for successes and failures
//! 2. Page bounds and the page-count cap
//! 3. Supersession: an older load never overwrites a newer one
//! 4. History and session bookkeeping
//! 5. Debounced query input

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use gitscout::client::{HttpResponse, HttpTransport, SearchClient, TransportError};
use gitscout::config::{ClientConfig, NavigationConfig};
use gitscout::navigation::{
    History, MemoryHistory, MemorySessionStore, NavigationController, SESSION_PAGE_KEY,
    SESSION_QUERY_KEY, STATUS_LOADING, STATUS_RATE_LIMITED, SessionStore,
};
use gitscout::view::{Pagination, RecordingView, StatusTone, ViewEvent};

/// Transport answering from a table of URL fragments
///
/// A gated fragment holds its requests until released; once released it stays open.
#[derive(Default)]
struct ScriptedTransport {
    calls: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, u16, String)>>,
    gates: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl ScriptedTransport {
    fn respond(&self, fragment: &str, status: u16, body: String) {
        self.responses
            .lock()
            .unwrap()
            .push((fragment.to_string(), status, body));
    }

    fn gate(&self, fragment: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(fragment.to_string(), watch::Sender::new(false));
    }

    fn release(&self, fragment: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(fragment) {
            gate.send_replace(true);
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());

        let gate = self
            .gates
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, gate)| gate.subscribe());
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _, _)| url.contains(fragment.as_str()))
            .map(|(_, status, body)| (*status, body.clone()));
        let (status, body) = response.unwrap_or((200, search_body(0, 0)));
        Ok(HttpResponse {
            status,
            body: body.into_bytes(),
        })
    }
}

fn search_body(count: usize, total_count: u64) -> String {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "name": format!("repo{}", i),
                "full_name": format!("owner{}/repo{}", i, i),
                "owner": {"login": format!("owner{}", i), "avatar_url": ""},
                "language": null,
                "stargazers_count": 500,
                "description": null,
                "html_url": format!("https://github.com/owner{}/repo{}", i, i),
            })
        })
        .collect();
    serde_json::json!({"total_count": total_count, "items": items}).to_string()
}

struct Harness {
    nav: Arc<NavigationController>,
    view: Arc<RecordingView>,
    history: Arc<MemoryHistory>,
    session: Arc<MemorySessionStore>,
    transport: Arc<ScriptedTransport>,
}

fn harness() -> Harness {
    harness_with(MemoryHistory::new(""), MemorySessionStore::new())
}

fn harness_with(history: MemoryHistory, session: MemorySessionStore) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let client = Arc::new(SearchClient::with_transport(
        ClientConfig::default(),
        transport.clone(),
    ));
    let view = Arc::new(RecordingView::new());
    let history = Arc::new(history);
    let session = Arc::new(session);
    let nav = Arc::new(NavigationController::new(
        client,
        view.clone(),
        history.clone(),
        session.clone(),
        NavigationConfig::default(),
    ));
    Harness {
        nav,
        view,
        history,
        session,
        transport,
    }
}

/// Tests a successful first page
///
/// This test verifies that:
/// 1. Loading status and skeletons are shown before the answer arrives
/// 2. total_pages is derived from total_count
/// 3. The summary status, cards and pagination match the page
/// 4. The session and history mirror the new state
#[tokio::test]
async fn test_successful_search_renders_page() {
    let h = harness();
    h.transport.respond("q=rust&", 200, search_body(10, 37));

    h.nav.set_query("rust").await;

    let state = h.nav.state();
    assert_eq!(state.query, "rust");
    assert_eq!(state.page, 1);
    assert_eq!(state.total_pages, 4);
    assert!(!state.loading);

    let events = h.view.events();
    assert_eq!(
        events[0],
        ViewEvent::Status {
            text: STATUS_LOADING.to_string(),
            tone: StatusTone::Neutral,
            busy: true
        }
    );
    assert!(events.contains(&ViewEvent::Skeletons(10)));
    assert_eq!(
        h.view.last_status(),
        Some(("10 results, page 1 of 4".to_string(), StatusTone::Neutral, false))
    );
    assert_eq!(h.view.last_cards().map(|c| c.len()), Some(10));
    assert_eq!(h.view.last_pagination(), Some(Pagination::new(1, 4)));
    assert_eq!(h.nav.results().len(), 10);

    assert_eq!(h.session.get(SESSION_QUERY_KEY).as_deref(), Some("rust"));
    assert_eq!(h.session.get(SESSION_PAGE_KEY).as_deref(), Some("1"));
    assert_eq!(h.history.current(), "q=rust&page=1");
    assert_eq!(h.history.len(), 2);
}

/// Tests that the page count is capped by the 1000-result window
#[tokio::test]
async fn test_total_pages_capped() {
    let h = harness();
    h.transport.respond("q=popular&", 200, search_body(10, 2500));

    h.nav.set_query("popular").await;

    assert_eq!(h.nav.state().total_pages, 100);
    assert_eq!(h.view.last_pagination(), Some(Pagination::new(1, 100)));
}

/// Tests that page moves stay within 1..=total_pages
#[tokio::test]
async fn test_page_bounds() {
    let h = harness();
    h.transport.respond("q=rust&", 200, search_body(10, 37));

    h.nav.set_query("rust").await;
    assert!(!h.nav.go_prev().await);
    assert_eq!(h.transport.calls().len(), 1);

    h.nav.set_page(4).await;
    assert_eq!(h.nav.state().page, 4);
    assert!(h.transport.calls()[1].contains("page=4"));
    assert_eq!(h.view.last_pagination(), Some(Pagination::new(4, 4)));
    assert!(!h.view.last_pagination().unwrap().next_enabled);

    assert!(!h.nav.go_next().await);
    assert_eq!(h.transport.calls().len(), 2);

    assert!(h.nav.go_prev().await);
    assert_eq!(h.nav.state().page, 3);
    assert_eq!(h.history.current(), "q=rust&page=3");
}

/// Tests the rate-limit failure path
#[tokio::test]
async fn test_rate_limited_search() {
    let h = harness();
    h.transport.respond(
        "q=limited&",
        403,
        r#"{"message":"API rate limit exceeded"}"#.to_string(),
    );

    h.nav.set_query("limited").await;

    assert_eq!(
        h.view.last_status(),
        Some((STATUS_RATE_LIMITED.to_string(), StatusTone::Error, false))
    );
    assert_eq!(h.view.last_cards(), Some(vec![]));
    assert_eq!(h.view.last_pagination(), Some(Pagination::new(1, 1)));
    assert_eq!(h.nav.state().total_pages, 1);
    assert!(!h.nav.state().loading);
    assert!(h.nav.results().is_empty());

    // Failures leave history and session untouched
    assert_eq!(h.history.len(), 1);
    assert_eq!(h.session.get(SESSION_QUERY_KEY), None);
}

/// Tests that a remote error message reaches the status line
#[tokio::test]
async fn test_remote_error_message() {
    let h = harness();
    h.transport.respond(
        "q=broken&",
        422,
        r#"{"message":"Validation Failed"}"#.to_string(),
    );

    h.nav.set_query("broken").await;

    assert_eq!(
        h.view.last_status(),
        Some((
            "An error occurred: Validation Failed".to_string(),
            StatusTone::Error,
            false
        ))
    );
}

/// Tests that a failure on a later page resets the page along with the page count
#[tokio::test]
async fn test_error_resets_page() {
    let h = harness();
    h.transport.respond(
        "q=rust&sort=stars&order=desc&per_page=10&page=3",
        403,
        r#"{"message":"API rate limit exceeded"}"#.to_string(),
    );
    h.transport.respond("q=rust&", 200, search_body(10, 37));

    h.nav.set_query("rust").await;
    h.nav.set_page(3).await;

    let state = h.nav.state();
    assert_eq!(state.page, 1);
    assert_eq!(state.total_pages, 1);
    assert_eq!(h.view.last_pagination(), Some(Pagination::new(1, 1)));
    assert!(!h.nav.go_prev().await);
    assert!(!h.nav.go_next().await);
    assert_eq!(h.transport.calls().len(), 2);
}

/// Tests that a newer search cancels an older one still on the wire
///
/// This test verifies that:
/// 1. The older load ends as Cancelled and renders nothing
/// 2. State, view and history reflect only the newer search
#[tokio::test]
async fn test_newer_search_supersedes_older() {
    let h = harness();
    h.transport.gate("q=slow&");
    h.transport.respond("q=slow&", 200, search_body(1, 500));
    h.transport.respond("q=fast&", 200, search_body(10, 37));

    let first = {
        let nav = h.nav.clone();
        tokio::spawn(async move { nav.set_query("slow").await })
    };
    h.transport.wait_for_calls(1).await;

    h.nav.set_query("fast").await;
    h.transport.release("q=slow&");
    first.await.unwrap();

    let state = h.nav.state();
    assert_eq!(state.query, "fast");
    assert_eq!(state.total_pages, 4);
    assert!(!state.loading);
    assert_eq!(
        h.view.last_status(),
        Some(("10 results, page 1 of 4".to_string(), StatusTone::Neutral, false))
    );
    assert_eq!(h.history.addresses(), vec!["", "q=fast&page=1"]);
    assert_eq!(h.nav.client().pending_requests(), 0);
}

/// Tests returning to a query whose request was just cancelled
///
/// The third load must not join the cancelled request for "alpha"; it issues a
/// new one and its outcome is the one rendered.
#[tokio::test]
async fn test_return_to_cancelled_query_loads_again() {
    let h = harness();
    h.transport.gate("q=alpha&");
    h.transport.gate("q=beta&");
    h.transport.respond("q=alpha&", 200, search_body(10, 37));
    h.transport.respond("q=beta&", 200, search_body(1, 1));

    let releaser = async {
        h.transport.wait_for_calls(3).await;
        h.transport.release("q=alpha&");
        h.transport.release("q=beta&");
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            h.nav.set_query("alpha"),
            h.nav.set_query("beta"),
            h.nav.set_query("alpha"),
            releaser,
        )
    })
    .await
    .expect("every load should settle");

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2].contains("q=alpha&"));

    let state = h.nav.state();
    assert_eq!(state.query, "alpha");
    assert_eq!(state.total_pages, 4);
    assert!(!state.loading);
    assert_eq!(
        h.view.last_status(),
        Some(("10 results, page 1 of 4".to_string(), StatusTone::Neutral, false))
    );
    assert_eq!(h.view.last_cards().map(|c| c.len()), Some(10));
    assert_eq!(h.history.addresses(), vec!["", "q=alpha&page=1"]);
    assert_eq!(h.nav.client().pending_requests(), 0);
}

/// Tests that a late success of an older load is discarded
///
/// The newer load is served from the cache, so the older request is not
/// cancelled and completes normally after it.
#[tokio::test]
async fn test_late_success_is_discarded() {
    let h = harness();
    h.transport.respond("q=fast&", 200, search_body(10, 37));
    h.transport.gate("q=slow&");
    h.transport.respond("q=slow&", 200, search_body(1, 500));

    h.nav.set_query("fast").await;

    let slow = {
        let nav = h.nav.clone();
        tokio::spawn(async move { nav.set_query("slow").await })
    };
    h.transport.wait_for_calls(2).await;

    h.nav.set_query("fast").await;
    h.transport.release("q=slow&");
    slow.await.unwrap();

    let state = h.nav.state();
    assert_eq!(state.query, "fast");
    assert_eq!(state.total_pages, 4);
    assert!(!state.loading);
    assert_eq!(h.nav.results().len(), 10);
    assert_eq!(
        h.view.last_status(),
        Some(("10 results, page 1 of 4".to_string(), StatusTone::Neutral, false))
    );
    assert_eq!(h.history.current(), "q=fast&page=1");
    assert_eq!(h.session.get(SESSION_QUERY_KEY).as_deref(), Some("fast"));
}

/// Tests that a load for the target already in flight is ignored
#[tokio::test]
async fn test_duplicate_load_while_loading_is_ignored() {
    let h = harness();
    h.transport.gate("q=once&");
    h.transport.respond("q=once&", 200, search_body(3, 3));

    let first = {
        let nav = h.nav.clone();
        tokio::spawn(async move { nav.set_query("once").await })
    };
    h.transport.wait_for_calls(1).await;

    h.nav.set_query("once").await;
    h.transport.release("q=once&");
    first.await.unwrap();

    assert_eq!(h.transport.calls().len(), 1);
    let loading_statuses = h
        .view
        .events()
        .into_iter()
        .filter(|e| matches!(e, ViewEvent::Status { busy: true, .. }))
        .count();
    assert_eq!(loading_statuses, 1);
    assert_eq!(h.nav.state().total_pages, 1);
    assert_eq!(h.history.len(), 2);
}

/// Tests back and forward navigation through history
///
/// This test verifies that:
/// 1. History moves restore the query and page from the address
/// 2. History moves do not add entries
/// 3. Revisited pages come from the cache
#[tokio::test]
async fn test_history_navigation() {
    let h = harness();
    h.transport.respond("q=alpha&", 200, search_body(10, 30));
    h.transport.respond("q=beta&", 200, search_body(5, 5));

    h.nav.set_query("alpha").await;
    h.nav.set_query("beta").await;
    assert_eq!(h.history.len(), 3);

    assert!(h.nav.go_back().await);
    let state = h.nav.state();
    assert_eq!(state.query, "alpha");
    assert_eq!(state.page, 1);
    assert_eq!(state.total_pages, 3);
    assert_eq!(h.history.len(), 3);
    assert_eq!(h.transport.calls().len(), 2);

    assert!(h.nav.go_forward().await);
    assert_eq!(h.nav.state().query, "beta");
    assert!(!h.nav.go_forward().await);

    // Back to the initial empty address means the default query
    assert!(h.nav.go_back().await);
    assert!(h.nav.go_back().await);
    assert_eq!(h.nav.state().query, "stars:>10000");
    assert!(!h.nav.go_back().await);
    assert_eq!(h.history.len(), 3);
}

/// Tests applying an address directly
#[tokio::test]
async fn test_history_navigated_reads_address_only() {
    let h = harness();
    h.transport.respond("q=tokio&", 200, search_body(10, 100));

    h.nav.on_history_navigated("?q=tokio&page=2").await;

    let state = h.nav.state();
    assert_eq!(state.query, "tokio");
    assert_eq!(state.page, 2);
    assert!(h.transport.calls()[0].contains("page=2"));
    assert_eq!(h.history.len(), 1);
    assert_eq!(h.session.get(SESSION_PAGE_KEY).as_deref(), Some("2"));
}

/// Tests that start() loads the hydrated state
#[tokio::test]
async fn test_start_loads_from_address_over_session() {
    let h = harness_with(
        MemoryHistory::new("q=from-url&page=2"),
        MemorySessionStore::with_entries([(SESSION_QUERY_KEY, "from-session")]),
    );

    h.nav.start().await;

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("q=from-url&"));
    assert!(calls[0].contains("page=2"));
    // The default response is empty
    assert_eq!(h.history.addresses(), vec!["q=from-url&page=2"]);
}

/// Tests that start() falls back to the session store
#[tokio::test]
async fn test_start_restores_session() {
    let h = harness_with(
        MemoryHistory::new(""),
        MemorySessionStore::with_entries([
            (SESSION_QUERY_KEY, "restored"),
            (SESSION_PAGE_KEY, "3"),
        ]),
    );
    h.transport.respond("q=restored&", 200, search_body(10, 100));

    h.nav.start().await;

    assert_eq!(h.nav.state().page, 3);
    assert_eq!(h.history.addresses(), vec!["q=restored&page=3"]);
}

/// Tests the detail view with and without topics
#[tokio::test]
async fn test_open_detail() {
    let h = harness();
    h.transport.respond("q=detail&", 200, search_body(2, 2));
    h.transport.respond(
        "/repos/owner0/repo0/topics",
        200,
        r#"{"names":["async","runtime"]}"#.to_string(),
    );
    h.transport.respond(
        "/repos/owner1/repo1/topics",
        404,
        r#"{"message":"Not Found"}"#.to_string(),
    );

    h.nav.set_query("detail").await;
    let results = h.nav.results();

    let detail = h.nav.open_detail(&results[0]).await;
    assert_eq!(detail.topics, vec!["async", "runtime"]);
    assert_eq!(h.view.last_modal(), Some(detail));

    let detail = h.nav.open_detail(&results[1]).await;
    assert!(detail.topics.is_empty());
    assert_eq!(detail.repo.full_name, "owner1/repo1");
    assert_eq!(h.view.last_modal(), Some(detail));
}

/// Tests that rapid typing searches only the last text
#[tokio::test(start_paused = true)]
async fn test_debounced_query() {
    let h = harness();

    for text in ["r", "ru", "rus"] {
        h.nav.schedule_query(text);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(h.transport.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(500)).await;

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("q=rus&"));
    assert_eq!(h.nav.state().query, "rus");
}

/// Tests that shutdown drops a pending debounced query
#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_pending_query() {
    let h = harness();

    h.nav.schedule_query("never");
    h.nav.shutdown();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(h.transport.calls().is_empty());
}
