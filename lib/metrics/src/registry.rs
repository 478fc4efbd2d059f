use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Counter, Histogram, HistogramSnapshot};

/// The value of a metric at the time it is reported
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    Counter(u64),
    Histogram(HistogramSnapshot),
}

/// Visits every registered metric, see [`Registry::report`]
pub trait Reporter {
    fn start_metric(&mut self, name: &'static str, description: &'static str);

    fn report(&mut self, observation: Observation);

    /// Finish recording a given metric
    fn finish_metric(&mut self);
}

#[derive(Clone)]
struct Entry<T> {
    description: &'static str,
    metric: T,
}

/// A set of named metrics.
///
/// There is no process wide instance, whoever needs to record something gets
/// a `Registry` passed in, and whoever exposes metrics holds a clone of it.
#[derive(Clone, Default)]
pub struct Registry {
    counters: Arc<Mutex<BTreeMap<&'static str, Entry<Counter>>>>,
    histograms: Arc<Mutex<BTreeMap<&'static str, Entry<Histogram>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter, or returns the existing one with the same name.
    pub fn register_counter(&self, name: &'static str, description: &'static str) -> Counter {
        assert_legal_name(name);

        self.counters
            .lock()
            .entry(name)
            .or_insert_with(|| Entry {
                description,
                metric: Counter::default(),
            })
            .metric
            .clone()
    }

    /// Registers a histogram, or returns the existing one with the same name,
    /// in which case `buckets` is ignored.
    pub fn register_histogram(
        &self,
        name: &'static str,
        description: &'static str,
        buckets: impl Iterator<Item = f64>,
    ) -> Histogram {
        assert_legal_name(name);

        self.histograms
            .lock()
            .entry(name)
            .or_insert_with(|| Entry {
                description,
                metric: Histogram::new(buckets),
            })
            .metric
            .clone()
    }

    pub fn report(&self, reporter: &mut impl Reporter) {
        for (name, entry) in self.counters.lock().iter() {
            reporter.start_metric(name, entry.description);
            reporter.report(Observation::Counter(entry.metric.fetch()));
            reporter.finish_metric();
        }

        for (name, entry) in self.histograms.lock().iter() {
            reporter.start_metric(name, entry.description);
            reporter.report(Observation::Histogram(entry.metric.snapshot()));
            reporter.finish_metric();
        }
    }
}

/// Panics if the provided name does not match [0-9a-z_]+
fn assert_legal_name(s: &str) {
    assert!(!s.is_empty(), "metric name must not be empty");
    assert!(
        s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='z' | '_')),
        "metric name must be [0-9a-z_]+ got: \"{s}\""
    )
}
