use std::io::IsTerminal;
use std::path::PathBuf;
use std::pin::pin;
use std::time::Duration;

use argh::FromArgs;
use discovery::Discoverer;
use exitcode::ExitCode;
use futures::StreamExt;
use marathon_sd::config::{self, Config};
use marathon_sd::signal::{SignalTo, os_signals};
use marathon_sd::{exporter, get_version, trace};
use metrics::Registry;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tripwire::Tripwire;

use crate::validate;

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(FromArgs)]
#[argh(
    description = "Discovers scrape targets from Marathon",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"info\".to_string()",
        description = "log level"
    )]
    log_level: String,

    #[argh(
        option,
        short = 'c',
        long = "config",
        default = "config::default_config_path()",
        description = "read configuration from the file, YAML or JSON"
    )]
    config: PathBuf,

    #[argh(
        option,
        short = 't',
        default = "default_worker_threads()",
        description = "specify how many threads the Tokio runtime will use"
    )]
    threads: usize,

    #[argh(subcommand)]
    sub_commands: Option<SubCommands>,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum SubCommands {
    Validate(validate::Validate),
}

impl RootCommand {
    #![allow(clippy::print_stdout)]
    fn show_version(&self) {
        println!("marathon-sd {}", get_version());
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        if let Some(SubCommands::Validate(validate)) = &self.sub_commands {
            return validate.run();
        }

        let levels =
            std::env::var(trace::LOG_ENV).unwrap_or_else(|_| trace::directives(&self.log_level));
        trace::init(std::io::stderr().is_terminal(), &levels);

        let config = config::load_from_path(&self.config).map_err(handle_config_errors)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("marathon-sd-worker")
            .worker_threads(self.threads)
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(message = "build tokio runtime failed", %err);
                exitcode::OSERR
            })?;

        info!(
            message = "Start marathon-sd",
            version = get_version(),
            threads = self.threads,
            config = ?self.config
        );

        runtime.block_on(start(config))?;

        runtime.shutdown_timeout(Duration::from_secs(5));

        Ok(())
    }
}

async fn start(config: Config) -> Result<(), ExitCode> {
    let registry = Registry::new();
    let discovery = config.marathon.build(&registry).map_err(|err| {
        error!(message = "build marathon discovery failed", %err);
        exitcode::CONFIG
    })?;

    let signals = os_signals().map_err(|err| {
        error!(message = "set up signal handlers failed", %err);
        exitcode::OSERR
    })?;
    let mut signals = pin!(signals);

    let (trigger, shutdown) = Tripwire::new();

    if let Some(endpoint) = config.metrics_endpoint() {
        let listener = TcpListener::bind(endpoint).await.map_err(|err| {
            error!(message = "bind metrics endpoint failed", %endpoint, %err);
            exitcode::UNAVAILABLE
        })?;

        info!(message = "serving metrics", %endpoint);
        tokio::spawn(exporter::serve(listener, registry.clone(), shutdown.clone()));
    }

    let (tx, rx) = mpsc::channel(1);
    let sink = tokio::spawn(config.output.build().run(rx));
    let mut discovery = tokio::spawn(discovery.run(tx, shutdown));

    let signal = tokio::select! {
        Some(signal) = signals.next() => signal,
        _ = &mut discovery => {
            error!(message = "marathon discovery stopped unexpectedly");

            trigger.cancel();
            let _ = sink.await;

            return Err(exitcode::SOFTWARE);
        }
    };

    match signal {
        SignalTo::Shutdown => {
            info!(message = "Shutdown signal received");

            trigger.cancel();

            tokio::select! {
                _ = async {
                    let _ = discovery.await;
                    let _ = sink.await;
                } => {},
                // a second signal quits immediately
                _ = signals.next() => {}
            }
        }

        SignalTo::Quit => {
            info!(message = "Quit signal received");
        }
    }

    Ok(())
}

fn handle_config_errors(errors: Vec<String>) -> ExitCode {
    for err in errors {
        error!(message = "configuration error", %err);
    }

    exitcode::CONFIG
}
