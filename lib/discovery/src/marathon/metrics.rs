use std::time::Duration;

use metrics::{Counter, Histogram, Registry, exponential_buckets};

/// Records how refreshes go, in the registry it was created from.
#[derive(Clone, Debug)]
pub struct RefreshMetrics {
    duration: Histogram,
    failures: Counter,
}

impl RefreshMetrics {
    pub fn new(registry: &Registry) -> Self {
        RefreshMetrics {
            duration: registry.register_histogram(
                "sd_marathon_refresh_duration_seconds",
                "The duration of a Marathon-SD refresh in seconds.",
                exponential_buckets(0.01, 2.0, 12),
            ),
            failures: registry.register_counter(
                "sd_marathon_refresh_failures_total",
                "The number of Marathon-SD refresh failures.",
            ),
        }
    }

    pub fn observe(&self, elapsed: Duration, failed: bool) {
        self.duration.record(elapsed.as_secs_f64());
        if failed {
            self.failures.inc(1);
        }
    }

    /// Number of finished refreshes, successful or not.
    pub fn refreshes(&self) -> u64 {
        self.duration.snapshot().count()
    }

    pub fn failures(&self) -> u64 {
        self.failures.fetch()
    }
}
