//! Service discovery for apps running on Marathon.

mod auth;
mod client;
mod config;
mod discovery;
mod error;
mod http;
mod metrics;
mod model;
mod secret;
mod targets;

pub use self::auth::{Auth, Credential};
pub use self::client::{
    APP_LIST_PATH, AppsClient, HttpAppsClient, parse_app_list, random_apps_url,
};
pub use self::config::{BasicAuth, Config, ConfigError};
pub use self::discovery::Discovery;
pub use self::error::Error;
pub use self::http::{HttpClient, HttpError, TlsConfig};
pub use self::metrics::RefreshMetrics;
pub use self::model::{
    App, AppList, Container, DockerContainer, IpAddress, Network, PortDefinition, PortMapping,
    Task,
};
pub use self::secret::SecretString;
pub use self::targets::{
    APP_LABEL, IMAGE_LABEL, PORT_INDEX_LABEL, TASK_LABEL, apps_to_target_groups,
    create_target_group, targets_for_app,
};
