use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Single-slot timer
///
/// Scheduling a task invalidates the previous one if its timer has not fired yet.
/// A task whose timer already fired runs to completion.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(None),
        }
    }

    /// Runs `task` after the delay unless another task is scheduled first
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timer = CancellationToken::new();
        if let Some(previous) = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer.clone())
        {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {
                    tracing::trace!("Debounced task replaced before firing");
                }
                _ = tokio::time::sleep(delay) => task.await,
            }
        });
    }

    /// Invalidates the pending timer, if any
    pub fn cancel(&self) {
        if let Some(timer) = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.cancel();
        }
    }
}
