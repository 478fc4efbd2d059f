use tracing_subscriber::EnvFilter;

/// Environment variable which overrides the `--log-level` option, it takes
/// full filter directives, e.g. `discovery=debug,info`.
pub const LOG_ENV: &str = "MARATHON_SD_LOG";

/// Turns a plain level into directives for the crates of this project,
/// anything else is used as is.
pub fn directives(level: &str) -> String {
    match level {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => {
            ["marathon_sd", "discovery", "metrics"]
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        }
        other => other.to_string(),
    }
}

/// Installs the global subscriber, events are written to stderr since stdout
/// might carry target groups.
pub fn init(color: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|err| {
        eprintln!("invalid log filter {levels:?}, {err}, fallback to info");
        EnvFilter::new(directives("info"))
    });

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = result {
        eprintln!("init tracing subscriber failed, {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_directives() {
        assert_eq!(
            directives("debug"),
            "marathon_sd=debug,discovery=debug,metrics=debug"
        );
        assert_eq!(directives("discovery=trace,warn"), "discovery=trace,warn");
    }
}
