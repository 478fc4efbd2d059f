use std::iter::once;
use std::sync::Arc;

use parking_lot::Mutex;

/// A single bucket, `count` is the number of observations `<= le`, not
/// including observations of lower buckets.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub le: f64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<Bucket>,
    pub sum: f64,
}

impl HistogramSnapshot {
    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

#[derive(Clone, Debug)]
pub struct Histogram {
    state: Arc<Mutex<HistogramSnapshot>>,
}

impl Histogram {
    /// Creates a histogram with the provided upper bounds, an implicit `+Inf`
    /// bucket is always appended.
    pub fn new(bounds: impl Iterator<Item = f64>) -> Self {
        let mut bounds = bounds.filter(|le| le.is_finite()).collect::<Vec<_>>();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        let buckets = bounds
            .into_iter()
            .chain(once(f64::INFINITY))
            .map(|le| Bucket { le, count: 0 })
            .collect();

        Self {
            state: Arc::new(Mutex::new(HistogramSnapshot { buckets, sum: 0.0 })),
        }
    }

    pub fn record(&self, value: f64) {
        let mut state = self.state.lock();

        if let Some(bucket) = state.buckets.iter_mut().find(|b| value <= b.le) {
            bucket.count = bucket.count.wrapping_add(1);
            state.sum += value;
        }
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.state.lock().clone()
    }
}

pub fn exponential_buckets(start: f64, factor: f64, length: usize) -> impl Iterator<Item = f64> {
    (0..length).map(move |i| start * factor.powi(i as i32))
}
