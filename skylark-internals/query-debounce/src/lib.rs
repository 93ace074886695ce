//! Skylark Query Debounce
//! Copyright (c) 2026 Skylark Contributors
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! skylark-internals/query-debounce
//! Debounce timers and latest-wins sequence gates for autocomplete-style external service calls

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time;

/// Returned by [`SequenceGate::admit`] when a newer request has been issued
/// since the ticket was taken.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("response superseded by a newer request")]
pub struct Superseded;

/// A fixed-delay debouncer owning its pending timer handle.
///
/// Each [`Debouncer::call`] schedules the given future to run after the
/// configured delay and aborts any previously scheduled run that has not
/// fired yet, so only the last call of a burst executes. Dropping the
/// debouncer cancels the pending timer.
///
/// # Examples
///
/// ```ignore
/// let debouncer = Debouncer::new(Duration::from_millis(500));
/// debouncer.call(|| async { /* fetch suggestions */ });
/// ```
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with a fixed coalescing window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// The coalescing window.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `fire` after the delay, superseding any pending call.
    ///
    /// Cancellation only reaches the timer: once the delay elapses the work
    /// is detached and runs to completion even if a newer call arrives
    /// (out-of-order results are a [`SequenceGate`] concern, not a timer
    /// concern). Must be called from within a tokio runtime.
    pub fn call<F, Fut>(&self, fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            tokio::spawn(fire());
        });

        let mut pending = self.pending.lock().expect("debounce lock poisoned");
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending timer, if any. Idempotent. Work whose timer has
    /// already elapsed is not affected.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().expect("debounce lock poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Whether a call is currently scheduled and has not fired or been
    /// cancelled. Advisory only: the handle is kept until replaced.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("debounce lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A ticket issued by a [`SequenceGate`], ordering one request against all
/// others issued from the same gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    /// The ticket's position in the issue order (1-based).
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// Latest-wins admission control for out-of-order responses.
///
/// Issue a ticket when a request is started; when its response arrives,
/// [`SequenceGate::admit`] succeeds only if no newer ticket has been issued
/// in the meantime. Responses of superseded requests are rejected so they
/// cannot overwrite the state of a later, still-pending query.
#[derive(Clone, Debug, Default)]
pub struct SequenceGate {
    latest: Arc<AtomicU64>,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket, superseding all previously issued ones.
    pub fn issue(&self) -> Ticket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { seq }
    }

    /// Admit a response for `ticket`, failing if it has been superseded.
    pub fn admit(&self, ticket: Ticket) -> Result<(), Superseded> {
        if self.latest.load(Ordering::SeqCst) == ticket.seq {
            Ok(())
        } else {
            Err(Superseded)
        }
    }

    /// Whether `ticket` is still the latest issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.admit(ticket).is_ok()
    }
}
