use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Token of one dispatched network request
#[derive(Debug, Clone)]
pub struct CancelTicket {
    id: u64,
    token: CancellationToken,
}

impl CancelTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Keeps exactly one request "current"
///
/// Issuing a ticket cancels the outstanding one, whatever signature it was for, so a
/// slow response to an old query can never land after a newer one.
#[derive(Debug, Default)]
pub struct CancellationController {
    current: Mutex<Option<CancelTicket>>,
    next_id: AtomicU64,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the outstanding ticket, if any, and returns a fresh current one
    pub fn start_new(&self) -> CancelTicket {
        let ticket = CancelTicket {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        };

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(ticket.clone()) {
            tracing::debug!("Cancelling superseded request #{}", previous.id);
            previous.token.cancel();
        }
        ticket
    }

    /// Marks `ticket` as settled so the next request has nothing to cancel
    pub fn release(&self, ticket: &CancelTicket) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|c| c.id == ticket.id) {
            current.take();
        }
    }

    /// Cancels the outstanding request without issuing a new one
    pub fn cancel_all(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.token.cancel();
        }
    }
}
