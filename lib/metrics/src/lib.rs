#![forbid(unsafe_code)]
#![deny(unused)]
#![deny(dead_code)]

mod counter;
mod histogram;
mod registry;
mod text;

pub use counter::Counter;
pub use histogram::{Bucket, Histogram, HistogramSnapshot, exponential_buckets};
pub use registry::{Observation, Registry, Reporter};
pub use text::TextReporter;
