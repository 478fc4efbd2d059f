#[macro_use]
extern crate tracing;

pub mod marathon;
mod sanitize;
mod target_group;

use std::future::Future;

use tokio::sync::mpsc::Sender;
use tripwire::Tripwire;

pub use sanitize::sanitize_label_name;
pub use target_group::{ADDRESS_LABEL, LabelSet, META_LABEL_PREFIX, TargetGroup};

/// Discoverer provides information about target groups. It maintains a set of
/// sources from which TargetGroup can originate.
///
/// `Discoverer` does not know if an actual change happened. It does guarantee
/// that it sends the new TargetGroup whenever a change happens. A group with
/// no targets and no labels means the source disappeared.
pub trait Discoverer: Send {
    /// Runs until `shutdown` resolves or `output` is closed. Sending to `output`
    /// blocks until the consumer has room, and is abandoned on shutdown.
    fn run(
        self,
        output: Sender<Vec<TargetGroup>>,
        shutdown: Tripwire,
    ) -> impl Future<Output = ()> + Send;
}
