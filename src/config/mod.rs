mod env;
mod format;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use env::{interpolate, vars};
pub use format::{Format, deserialize};

use crate::exporter::ExporterConfig;
use crate::sinks::OutputConfig;

/// The whole configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub marathon: discovery::marathon::Config,

    #[serde(default)]
    pub output: OutputConfig,

    /// Serve the refresh metrics, disabled if not set.
    pub metrics: Option<ExporterConfig>,
}

impl Config {
    /// Checks everything which does not need the filesystem or the network.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errs = vec![];

        if let Err(err) = self.marathon.validate() {
            errs.push(err.to_string());
        }

        if let OutputConfig::File { path } = &self.output
            && path.file_name().is_none()
        {
            errs.push(format!("output path {path:?} is not a file"));
        }

        if errs.is_empty() { Ok(()) } else { Err(errs) }
    }

    pub fn metrics_endpoint(&self) -> Option<SocketAddr> {
        self.metrics.as_ref().map(|metrics| metrics.endpoint)
    }
}

/// Loads a config file, environment variables are interpolated before
/// parsing and the result is validated.
pub fn load_from_path(path: &Path) -> Result<Config, Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| vec![format!("read config file {path:?} failed, {err}")])?;

    load_from_str(&content, Format::from_path(path))
}

pub fn load_from_str(content: &str, format: Option<Format>) -> Result<Config, Vec<String>> {
    let vars = vars();
    let content = interpolate(content, &vars)?;
    let config = deserialize::<Config>(&content, format)?;

    config.validate()?;

    Ok(config)
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/marathon-sd/marathon-sd.yaml")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn minimal() {
        let config = load_from_str(
            r#"
marathon:
  servers:
    - http://marathon-1:8080
"#,
            None,
        )
        .unwrap();

        assert_eq!(config.marathon.servers, vec!["http://marathon-1:8080"]);
        assert_eq!(config.marathon.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.output, OutputConfig::Console);
        assert!(config.metrics_endpoint().is_none());
    }

    #[test]
    fn full() {
        let config = load_from_str(
            r#"
marathon:
  servers:
    - http://marathon-1:8080
    - https://marathon-2
  refresh_interval: 1m
  bearer_token: abc
  tls:
    ca_file: /etc/ssl/marathon.pem
output:
  type: file
  path: /etc/prometheus/marathon.json
metrics:
  endpoint: 0.0.0.0:9465
"#,
            Some(Format::YAML),
        )
        .unwrap();

        assert_eq!(config.marathon.refresh_interval, Duration::from_secs(60));
        assert_eq!(
            config.output,
            OutputConfig::File {
                path: PathBuf::from("/etc/prometheus/marathon.json")
            }
        );
        assert_eq!(
            config.metrics_endpoint(),
            Some("0.0.0.0:9465".parse().unwrap())
        );
    }

    #[test]
    fn json() {
        let config = load_from_str(
            r#"{"marathon": {"servers": ["http://marathon:8080"]}, "metrics": {}}"#,
            Some(Format::JSON),
        )
        .unwrap();

        assert_eq!(
            config.metrics_endpoint(),
            Some("127.0.0.1:9465".parse().unwrap())
        );
    }

    #[test]
    fn invalid() {
        for input in [
            // no servers
            "marathon:\n  servers: []\n",
            // conflicting auth
            "marathon:\n  servers: [http://m]\n  auth_token: a\n  bearer_token: b\n",
            // unknown field
            "marathon:\n  servers: [http://m]\nunknown: 1\n",
            // unknown output
            "marathon:\n  servers: [http://m]\noutput:\n  type: kafka\n",
            // missing environment variable
            "marathon:\n  servers: [http://m]\n  auth_token: ${MARATHON_SD_TEST_NOT_SET:?token}\n",
        ] {
            assert!(load_from_str(input, None).is_err(), "{input}");
        }
    }

    #[test]
    fn missing_file() {
        let errs = load_from_path(Path::new("/nonexistent/marathon-sd.yaml")).unwrap_err();
        assert_eq!(errs.len(), 1);
    }
}
