//! Registry of searches that are currently on the wire
//!
//! When a debounce timer and a pagination click race for the same signature, both
//! callers should share one network round-trip. The registry hands out clones of a
//! single [`Shared`] future per signature and forgets it as soon as it settles.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio_util::sync::CancellationToken;

use super::error::SearchError;
use super::models::SearchPage;
use super::params::RequestSignature;

/// Outcome every waiter of one search observes
pub type SearchOutcome = Result<SearchPage, SearchError>;

/// Clonable handle on an in-flight search
pub type SharedSearch = Shared<BoxFuture<'static, SearchOutcome>>;

/// One registered search and the token that aborts it
struct Registration {
    id: u64,
    token: CancellationToken,
    shared: SharedSearch,
}

type PendingMap = HashMap<RequestSignature, Registration>;

/// At most one live operation per signature
///
/// A registration whose token has been cancelled no longer counts as live: its
/// waiters will only ever see `Cancelled`, so a new caller gets a fresh operation.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: Arc<Mutex<PendingMap>>,
    next_id: AtomicU64,
}

/// Removes a registration when the future owning it completes or is dropped
///
/// The id check keeps a finished operation from removing a newer registration for
/// the same signature.
struct RegistrationGuard {
    pending: Weak<Mutex<PendingMap>>,
    key: RequestSignature,
    id: u64,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        let Some(pending) = self.pending.upgrade() else {
            return;
        };
        let removed = {
            let mut map = pending.lock().unwrap_or_else(PoisonError::into_inner);
            match map.get(&self.key) {
                Some(registration) if registration.id == self.id => map.remove(&self.key),
                _ => None,
            }
        };
        if removed.is_some() {
            tracing::debug!("Request settled, unregistered {}", self.key);
        }
        // `removed` drops here, after the lock is released
    }
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live search for `key`, or registers the one built by `factory`
    ///
    /// `factory` returns the operation together with the token that cancels it. It
    /// runs only when no live registration exists for `key`, and runs while the
    /// registry is locked, so it must not call back into the registry. The returned
    /// future is lazy: the network call starts when a caller first polls it.
    pub fn get_or_create<F, Fut>(&self, key: &RequestSignature, factory: F) -> SharedSearch
    where
        F: FnOnce() -> (CancellationToken, Fut),
        Fut: Future<Output = SearchOutcome> + Send + 'static,
    {
        let mut map = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        match map.get(key) {
            Some(registration) if !registration.token.is_cancelled() => {
                tracing::debug!("Joining in-flight request for {}", key);
                return registration.shared.clone();
            }
            Some(_) => tracing::debug!("Replacing cancelled request for {}", key),
            None => {}
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = RegistrationGuard {
            pending: Arc::downgrade(&self.pending),
            key: key.clone(),
            id,
        };
        let (token, operation) = factory();
        let shared = async move {
            let _guard = guard;
            operation.await
        }
        .boxed()
        .shared();

        tracing::debug!("Registered new request for {}", key);
        let replaced = map.insert(
            key.clone(),
            Registration {
                id,
                token,
                shared: shared.clone(),
            },
        );
        drop(map);
        // Dropping the last handle of a replaced operation runs its guard, which
        // locks the map again
        drop(replaced);
        shared
    }

    /// Number of signatures with a request on the wire
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
