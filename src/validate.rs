use std::io::IsTerminal;
use std::path::PathBuf;

use argh::FromArgs;
use exitcode::ExitCode;
use marathon_sd::config;
use metrics::Registry;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "validate",
    description = "Validate the config file, including readability of credential files, then exit",
    help_triggers("-h", "--help")
)]
pub struct Validate {
    #[argh(
        option,
        short = 'c',
        long = "config",
        default = "config::default_config_path()",
        description = "path of the config file"
    )]
    config: PathBuf,
}

impl Validate {
    #![allow(clippy::print_stdout)]
    pub fn run(&self) -> Result<(), ExitCode> {
        let fmt = Formatter::new(std::io::stdout().is_terminal());

        let config = match config::load_from_path(&self.config) {
            Ok(config) => config,
            Err(errs) => {
                fmt.title(format!("Failed to load {:?}", self.config));
                for err in errs {
                    fmt.error(err);
                }

                return Err(exitcode::CONFIG);
            }
        };
        fmt.success(format!("Loaded {:?}", self.config));

        // builds the http client and reads credential files, nothing is
        // sent to Marathon
        if let Err(err) = config.marathon.build(&Registry::new()) {
            fmt.error(err.to_string());
            return Err(exitcode::CONFIG);
        }
        fmt.success(format!(
            "Marathon discovery, {} server(s) every {:?}",
            config.marathon.servers.len(),
            config.marathon.refresh_interval
        ));

        println!("Validated");

        Ok(())
    }
}

struct Formatter {
    error_intro: &'static str,
    success_intro: &'static str,
}

impl Formatter {
    fn new(color: bool) -> Self {
        Self {
            error_intro: if color {
                // red
                "\x1b[31mx\x1b[0m"
            } else {
                "x"
            },
            success_intro: if color {
                // green
                "\x1b[32m√\x1b[0m"
            } else {
                "√"
            },
        }
    }

    fn title(&self, title: impl AsRef<str>) {
        let title = title.as_ref();
        println!("{title}\n{:-<width$}", "", width = title.len());
    }

    fn success(&self, msg: impl AsRef<str>) {
        println!("{} {}", self.success_intro, msg.as_ref());
    }

    fn error(&self, err: impl AsRef<str>) {
        println!("{} {}", self.error_intro, err.as_ref());
    }
}
