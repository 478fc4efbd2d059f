#[macro_use]
extern crate tracing;

pub mod config;
pub mod exporter;
pub mod signal;
pub mod sinks;
pub mod trace;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
