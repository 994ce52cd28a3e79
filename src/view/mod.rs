//! Rendering boundary
//!
//! The navigation controller never formats output itself. It tells a [`View`] what
//! to show: cards, skeleton placeholders, a status line, the pagination indicator
//! and the detail modal. [`TerminalView`] prints to stdout for the CLI;
//! [`RecordingView`] keeps everything in memory for headless use and tests.

mod terminal;

use std::sync::{Mutex, PoisonError};

use crate::client::{RepoDetail, RepoSummary};

pub use terminal::TerminalView;

/// Visual tone of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTone {
    #[default]
    Neutral,
    /// Informational, e.g. "No results."
    Muted,
    Error,
}

/// Pagination indicator plus the enabled state of the prev/next controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        Self {
            page,
            total_pages,
            prev_enabled: page > 1,
            next_enabled: page < total_pages,
        }
    }
}

/// Receives rendering requests from the navigation controller
pub trait View: Send + Sync {
    fn set_status(&self, text: &str, tone: StatusTone, busy: bool);

    fn clear_cards(&self);

    /// Show `count` placeholder cards while a search is running
    fn render_skeletons(&self, count: usize);

    fn render_cards(&self, repos: &[RepoSummary]);

    fn update_pagination(&self, pagination: Pagination);

    fn open_modal(&self, detail: &RepoDetail);
}

/// One rendering request received by a [`RecordingView`]
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Status {
        text: String,
        tone: StatusTone,
        busy: bool,
    },
    ClearCards,
    Skeletons(usize),
    Cards(Vec<RepoSummary>),
    Pagination(Pagination),
    Modal(RepoDetail),
}

/// [`View`] that records every request
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: ViewEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Most recent status line as `(text, tone, busy)`
    pub fn last_status(&self) -> Option<(String, StatusTone, bool)> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Status { text, tone, busy } => Some((text, tone, busy)),
            _ => None,
        })
    }

    /// Cards of the most recent `render_cards` call
    pub fn last_cards(&self) -> Option<Vec<RepoSummary>> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Cards(cards) => Some(cards),
            _ => None,
        })
    }

    pub fn last_pagination(&self) -> Option<Pagination> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Pagination(p) => Some(p),
            _ => None,
        })
    }

    pub fn last_modal(&self) -> Option<RepoDetail> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Modal(detail) => Some(detail),
            _ => None,
        })
    }
}

impl View for RecordingView {
    fn set_status(&self, text: &str, tone: StatusTone, busy: bool) {
        self.record(ViewEvent::Status {
            text: text.to_string(),
            tone,
            busy,
        });
    }

    fn clear_cards(&self) {
        self.record(ViewEvent::ClearCards);
    }

    fn render_skeletons(&self, count: usize) {
        self.record(ViewEvent::Skeletons(count));
    }

    fn render_cards(&self, repos: &[RepoSummary]) {
        self.record(ViewEvent::Cards(repos.to_vec()));
    }

    fn update_pagination(&self, pagination: Pagination) {
        self.record(ViewEvent::Pagination(pagination));
    }

    fn open_modal(&self, detail: &RepoDetail) {
        self.record(ViewEvent::Modal(detail.clone()));
    }
}
