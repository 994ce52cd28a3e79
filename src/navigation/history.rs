//! Address history
//!
//! Each entry is a form-urlencoded query string such as `q=tokio&page=2`, the same
//! shape a browser keeps after `?` in the address bar. The address is the only
//! source of truth on back/forward navigation.

use std::sync::{Mutex, PoisonError};
use url::form_urlencoded;

use crate::client::params::{DEFAULT_QUERY, normalize_query};

/// Address parameter holding the query
pub const ADDRESS_QUERY_PARAM: &str = "q";

/// Address parameter holding the page
pub const ADDRESS_PAGE_PARAM: &str = "page";

/// Navigation state carried by one address
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressState {
    pub query: Option<String>,
    pub page: Option<u32>,
}

impl AddressState {
    /// Whether the address carries any navigation parameter
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.page.is_none()
    }

    /// Query to search, the default one when the address has none
    pub fn query_or_default(&self) -> String {
        self.query
            .as_deref()
            .map(normalize_query)
            .unwrap_or_else(|| DEFAULT_QUERY.to_string())
    }

    pub fn page_or_default(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

/// Reads `q` and `page` out of a query string
///
/// A leading `?` is accepted. Blank queries and pages that are not positive
/// integers are treated as absent.
pub fn parse_address(address: &str) -> AddressState {
    let raw = address.strip_prefix('?').unwrap_or(address);
    let mut state = AddressState::default();

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            ADDRESS_QUERY_PARAM if !value.trim().is_empty() => {
                state.query = Some(value.trim().to_string());
            }
            ADDRESS_PAGE_PARAM => {
                state.page = value.trim().parse::<u32>().ok().filter(|p| *p > 0);
            }
            _ => {}
        }
    }
    state
}

/// Builds the address for `{query, page}`, omitting `q` for the default query
pub fn format_address(query: &str, page: u32) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if query != DEFAULT_QUERY {
        serializer.append_pair(ADDRESS_QUERY_PARAM, query);
    }
    serializer.append_pair(ADDRESS_PAGE_PARAM, &page.to_string());
    serializer.finish()
}

/// Stack of addresses with a cursor
pub trait History: Send + Sync {
    /// Address of the current entry
    fn current(&self) -> String;

    /// Adds an entry after the current one, discarding any forward entries
    fn push(&self, address: &str);

    /// Overwrites the current entry
    fn replace(&self, address: &str);

    /// Moves one entry back and returns its address
    fn back(&self) -> Option<String>;

    /// Moves one entry forward and returns its address
    fn forward(&self) -> Option<String>;
}

#[derive(Debug)]
struct Entries {
    addresses: Vec<String>,
    cursor: usize,
}

/// In-memory [`History`]
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryHistory {
    /// Creates a history whose only entry is `initial`
    pub fn new(initial: &str) -> Self {
        Self {
            entries: Mutex::new(Entries {
                addresses: vec![initial.to_string()],
                cursor: 0,
            }),
        }
    }

    /// Every address, oldest first
    pub fn addresses(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl History for MemoryHistory {
    fn current(&self) -> String {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.addresses[entries.cursor].clone()
    }

    fn push(&self, address: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let keep = entries.cursor + 1;
        entries.addresses.truncate(keep);
        entries.addresses.push(address.to_string());
        entries.cursor = keep;
    }

    fn replace(&self, address: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = entries.cursor;
        entries.addresses[cursor] = address.to_string();
    }

    fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.cursor == 0 {
            return None;
        }
        entries.cursor -= 1;
        Some(entries.addresses[entries.cursor].clone())
    }

    fn forward(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.cursor + 1 >= entries.addresses.len() {
            return None;
        }
        entries.cursor += 1;
        Some(entries.addresses[entries.cursor].clone())
    }
}
