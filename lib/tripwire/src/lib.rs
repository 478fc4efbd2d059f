//! A one-shot cancellation signal.
//!
//! [`Tripwire::new`] returns a [`Trigger`] and a [`Tripwire`]. The tripwire is a
//! future which resolves once the trigger is cancelled or dropped, so it can be
//! raced with `tokio::select!` at every suspension point of a long running
//! loop. Tripwires are cheap to clone and every clone resolves together.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct Shared {
    // set once the trigger is cancelled or dropped
    tripped: AtomicBool,

    next_id: AtomicU64,
    wakers: Mutex<HashMap<u64, Waker>>,
}

impl Shared {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn trip(&self) {
        if self.tripped.swap(true, Ordering::SeqCst) {
            return;
        }

        let wakers = std::mem::take(
            &mut *self
                .wakers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        wakers.into_values().for_each(Waker::wake);
    }
}

/// The sending half, dropping it resolves every associated [`Tripwire`].
pub struct Trigger {
    shared: Arc<Shared>,
}

impl Trigger {
    /// Resolve all associated tripwires.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Trigger {
    fn drop(&mut self) {
        self.shared.trip();
    }
}

/// Resolves once the paired [`Trigger`] is cancelled or dropped.
pub struct Tripwire {
    shared: Arc<Shared>,
    id: u64,
}

impl Tripwire {
    pub fn new() -> (Trigger, Tripwire) {
        let shared = Arc::new(Shared::default());

        (
            Trigger {
                shared: Arc::clone(&shared),
            },
            Tripwire {
                id: shared.next_id(),
                shared,
            },
        )
    }

    /// Returns `true` once the trigger is gone, without registering interest.
    pub fn is_tripped(&self) -> bool {
        self.shared.tripped.load(Ordering::SeqCst)
    }
}

impl Clone for Tripwire {
    fn clone(&self) -> Self {
        Self {
            id: self.shared.next_id(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Tripwire {
    fn drop(&mut self) {
        self.shared
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl Future for Tripwire {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_tripped() {
            return Poll::Ready(());
        }

        self.shared
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.id, cx.waker().clone());

        // the trigger might be gone between the first check and the registration
        if self.is_tripped() {
            return Poll::Ready(());
        }

        Poll::Pending
    }
}
