use std::path::{Path, PathBuf};
use std::time::Duration;

use http::Uri;
use metrics::Registry;
use serde::Deserialize;
use thiserror::Error;

use super::auth::{Auth, Credential};
use super::client::HttpAppsClient;
use super::discovery::Discovery;
use super::http::{HttpClient, HttpError, TlsConfig};
use super::metrics::RefreshMetrics;
use super::secret::SecretString;

const fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("marathon_sd: must contain at least one Marathon server")]
    NoServers,

    #[error("marathon_sd: invalid server {server:?}, {reason}")]
    InvalidServer { server: String, reason: String },

    #[error("marathon_sd: refresh_interval must be greater than zero")]
    ZeroInterval,

    #[error("marathon_sd: at most one of {0} must be configured")]
    ConflictingAuth(&'static str),

    #[error("marathon_sd: tls.cert_file and tls.key_file must be configured together")]
    IncompleteClientAuth,

    #[error("marathon_sd: unable to read {kind} file {path:?}, {source}")]
    ReadFile {
        kind: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("marathon_sd: {0}")]
    Http(#[from] HttpError),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<SecretString>,
    pub password_file: Option<PathBuf>,
}

/// Marathon service discovery polls the app list of Marathon servers and
/// turns every app into a target group.
///
/// ```yaml
/// servers:
///   - http://marathon-1:8080
///   - http://marathon-2:8080
/// refresh_interval: 30s
/// auth_token_file: /var/run/secrets/marathon-token
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Marathon servers, one of them is picked randomly for every refresh.
    pub servers: Vec<String>,

    /// How long to wait between the end of a refresh and the next one.
    #[serde(
        default = "default_refresh_interval",
        with = "humanize::duration::serde"
    )]
    pub refresh_interval: Duration,

    /// Sent as `Authorization: token=<auth_token>`, as DC/OS expects.
    pub auth_token: Option<SecretString>,
    /// Like `auth_token`, but read from a file for every request.
    pub auth_token_file: Option<PathBuf>,

    pub basic_auth: Option<BasicAuth>,
    pub bearer_token: Option<SecretString>,
    pub bearer_token_file: Option<PathBuf>,

    pub tls: Option<TlsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            servers: vec![],
            refresh_interval: default_refresh_interval(),
            auth_token: None,
            auth_token_file: None,
            basic_auth: None,
            bearer_token: None,
            bearer_token_file: None,
            tls: None,
        }
    }
}

impl Config {
    /// Checks everything that can be checked without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }

        for server in &self.servers {
            let uri = server
                .parse::<Uri>()
                .map_err(|err| ConfigError::InvalidServer {
                    server: server.clone(),
                    reason: err.to_string(),
                })?;

            match uri.scheme_str() {
                Some("http") | Some("https") if uri.authority().is_some() => {}
                _ => {
                    return Err(ConfigError::InvalidServer {
                        server: server.clone(),
                        reason: "an absolute http or https url is required".to_string(),
                    });
                }
            }
        }

        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        let auth_token = self.auth_token.is_some() || self.auth_token_file.is_some();
        let bearer = self.bearer_token.is_some() || self.bearer_token_file.is_some();

        if self.auth_token.is_some() && self.auth_token_file.is_some() {
            return Err(ConfigError::ConflictingAuth("auth_token & auth_token_file"));
        }
        if self.basic_auth.is_some() && auth_token {
            return Err(ConfigError::ConflictingAuth(
                "basic_auth, auth_token & auth_token_file",
            ));
        }
        if bearer && auth_token {
            return Err(ConfigError::ConflictingAuth(
                "bearer_token, bearer_token_file, auth_token & auth_token_file",
            ));
        }
        if self.bearer_token.is_some() && self.bearer_token_file.is_some() {
            return Err(ConfigError::ConflictingAuth(
                "bearer_token & bearer_token_file",
            ));
        }
        if self.basic_auth.is_some() && bearer {
            return Err(ConfigError::ConflictingAuth(
                "basic_auth, bearer_token & bearer_token_file",
            ));
        }
        if let Some(basic) = &self.basic_auth
            && basic.password.is_some()
            && basic.password_file.is_some()
        {
            return Err(ConfigError::ConflictingAuth(
                "basic_auth.password & basic_auth.password_file",
            ));
        }
        if let Some(tls) = &self.tls
            && tls.cert_file.is_some() != tls.key_file.is_some()
        {
            return Err(ConfigError::IncompleteClientAuth);
        }

        Ok(())
    }

    /// Builds the configured authentication, every configured file must be
    /// readable right now.
    pub fn auth(&self) -> Result<Option<Auth>, ConfigError> {
        let auth = if let Some(token) = &self.auth_token {
            Auth::Token(Credential::Static(token.clone()))
        } else if let Some(path) = &self.auth_token_file {
            Auth::Token(credential_file("auth token", path)?)
        } else if let Some(token) = &self.bearer_token {
            Auth::Bearer(Credential::Static(token.clone()))
        } else if let Some(path) = &self.bearer_token_file {
            Auth::Bearer(credential_file("bearer token", path)?)
        } else if let Some(basic) = &self.basic_auth {
            let password = match (&basic.password, &basic.password_file) {
                (_, Some(path)) => credential_file("password", path)?,
                (Some(password), None) => Credential::Static(password.clone()),
                (None, None) => Credential::Static(SecretString::from("")),
            };

            Auth::Basic {
                username: basic.username.clone(),
                password,
            }
        } else {
            return Ok(None);
        };

        Ok(Some(auth))
    }

    /// Validates the config and builds the discovery on top of an
    /// authenticated HTTP client.
    pub fn build(&self, registry: &Registry) -> Result<Discovery<HttpAppsClient>, ConfigError> {
        self.validate()?;

        let client = HttpClient::new(self.tls.as_ref(), self.auth()?)?;

        Ok(Discovery::new(
            HttpAppsClient::new(client),
            self.servers.clone(),
            self.refresh_interval,
            RefreshMetrics::new(registry),
        ))
    }
}

fn credential_file(kind: &'static str, path: &Path) -> Result<Credential, ConfigError> {
    Credential::file(path).map_err(|source| ConfigError::ReadFile {
        kind,
        path: path.to_path_buf(),
        source,
    })
}
