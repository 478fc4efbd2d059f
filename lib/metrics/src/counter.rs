use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic counter, clones share the same value.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    state: Arc<AtomicU64>,
}

impl Counter {
    #[inline]
    pub fn inc(&self, i: u64) {
        self.state.fetch_add(i, Ordering::Relaxed);
    }

    #[inline]
    pub fn fetch(&self) -> u64 {
        self.state.load(Ordering::Relaxed)
    }
}
