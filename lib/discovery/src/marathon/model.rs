//! The subset of the Marathon `/v2/apps` response this discovery needs.
//!
//! Marathon omits empty fields or sends `null` depending on version and
//! endpoint, both decode to empty values. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A list of Marathon apps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AppList {
    #[serde(default, deserialize_with = "nullable")]
    pub apps: Vec<App>,
}

/// App describes a service running on Marathon.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct App {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tasks: Vec<Task>,
    #[serde(rename = "tasksRunning", default, deserialize_with = "nullable")]
    pub running_tasks: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub container: Container,
    #[serde(default, deserialize_with = "nullable")]
    pub port_definitions: Vec<PortDefinition>,
    #[serde(default, deserialize_with = "nullable")]
    pub networks: Vec<Network>,
}

impl App {
    /// Whether the app's first network is in mode `container`, only the first
    /// network counts.
    pub fn is_container_net(&self) -> bool {
        self.networks
            .first()
            .is_some_and(|network| network.mode == "container")
    }
}

/// Task describes one instance of a service running on Marathon.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub host: String,
    #[serde(default, deserialize_with = "nullable")]
    pub ports: Vec<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub ip_addresses: Vec<IpAddress>,
}

/// The address and protocol the container's network interface is bound to.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct IpAddress {
    #[serde(rename = "ipAddress", default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(default, deserialize_with = "nullable")]
    pub protocol: String,
}

/// Which port the process binds inside the container, and which port
/// Marathon exposes for it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(default, deserialize_with = "nullable")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub container_port: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub service_port: u32,
}

/// A container which uses the docker runtime.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DockerContainer {
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    /// Where port mappings lived before Marathon 1.5
    #[serde(default, deserialize_with = "nullable")]
    pub port_mappings: Vec<PortMapping>,
}

/// The runtime an app is running in.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default, deserialize_with = "nullable")]
    pub docker: DockerContainer,
    #[serde(default, deserialize_with = "nullable")]
    pub port_mappings: Vec<PortMapping>,
}

/// Which load balancer port should be used to access the service.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PortDefinition {
    #[serde(default, deserialize_with = "nullable")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub port: u32,
}

/// The name and type of network the container is attached to.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Network {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub mode: String,
}
