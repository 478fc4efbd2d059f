//! Consumers of the target groups a discovery produces.

mod console;
mod file_sd;

use std::path::PathBuf;

use discovery::TargetGroup;
use serde::Deserialize;
use tokio::io::Stdout;
use tokio::sync::mpsc::Receiver;

pub use console::Console;
pub use file_sd::FileSd;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum OutputConfig {
    /// One JSON line per batch on stdout.
    #[default]
    Console,

    /// Keeps a Prometheus `file_sd` document up to date.
    File { path: PathBuf },
}

impl OutputConfig {
    pub fn build(&self) -> Sink {
        match self {
            OutputConfig::Console => Sink::Console(Console::new(tokio::io::stdout())),
            OutputConfig::File { path } => Sink::File(FileSd::new(path.clone())),
        }
    }
}

pub enum Sink {
    Console(Console<Stdout>),
    File(FileSd),
}

impl Sink {
    /// Consumes batches until every sender is gone. A failed write is
    /// logged, the next batch tries again.
    pub async fn run(self, mut input: Receiver<Vec<TargetGroup>>) {
        match self {
            Sink::Console(mut console) => {
                while let Some(batch) = input.recv().await {
                    if let Err(err) = console.write(&batch).await {
                        error!(message = "write target groups to stdout failed", %err);
                    }
                }
            }
            Sink::File(mut file) => {
                while let Some(batch) = input.recv().await {
                    file.apply(batch);

                    if let Err(err) = file.flush().await {
                        error!(
                            message = "write file_sd failed",
                            path = ?file.path(),
                            %err
                        );
                    }
                }
            }
        }

        debug!(message = "output closed");
    }
}
