use std::collections::{BTreeMap, HashMap};

use super::model::{App, AppList, PortMapping, Task};
use crate::{ADDRESS_LABEL, LabelSet, TargetGroup, sanitize_label_name};

/// The prefix for the application labels.
const APP_LABEL_PREFIX: &str = "__meta_marathon_app_label_";

/// The name of the app in Marathon.
pub const APP_LABEL: &str = "__meta_marathon_app";
/// The docker image running the service, empty if there is none.
pub const IMAGE_LABEL: &str = "__meta_marathon_image";
/// The integer index of the port, e.g. PORT1 would have a value of '1'
pub const PORT_INDEX_LABEL: &str = "__meta_marathon_port_index";
/// The Mesos task name of the app instance.
pub const TASK_LABEL: &str = "__meta_marathon_task";

/// The prefix for labels of `portMappings` entries.
const PORT_MAPPING_LABEL_PREFIX: &str = "__meta_marathon_port_mapping_label_";
/// The prefix for labels of `portDefinitions` entries.
const PORT_DEFINITION_LABEL_PREFIX: &str = "__meta_marathon_port_definition_label_";

/// Ports declared once for the whole app, shared by all of its tasks.
struct AppPorts<'a> {
    ports: Vec<u32>,
    labels: Vec<&'a BTreeMap<String, String>>,
    prefix: &'static str,
}

impl<'a> AppPorts<'a> {
    /// Prefer the container port when the app is in a container network,
    /// otherwise the randomly generated service port.
    fn from_port_mappings(mappings: &'a [PortMapping], container_net: bool) -> Self {
        let ports = mappings
            .iter()
            .map(|mapping| {
                if container_net {
                    mapping.container_port
                } else {
                    mapping.service_port
                }
            })
            .collect();

        AppPorts {
            ports,
            labels: mappings.iter().map(|mapping| &mapping.labels).collect(),
            prefix: PORT_MAPPING_LABEL_PREFIX,
        }
    }

    /// Picks the first non-empty port source, in order:
    ///
    /// 1. `container.portMappings`, Marathon 1.5 and later
    /// 2. `container.docker.portMappings`, before Marathon 1.5
    /// 3. `portDefinitions`, the literal port regardless of the network
    ///
    /// `None` means every task has to bring its own ports, e.g. host networking.
    fn select(app: &'a App) -> Option<Self> {
        let container_net = app.is_container_net();

        if !app.container.port_mappings.is_empty() {
            Some(Self::from_port_mappings(
                &app.container.port_mappings,
                container_net,
            ))
        } else if !app.container.docker.port_mappings.is_empty() {
            Some(Self::from_port_mappings(
                &app.container.docker.port_mappings,
                container_net,
            ))
        } else if !app.port_definitions.is_empty() {
            Some(AppPorts {
                ports: app.port_definitions.iter().map(|def| def.port).collect(),
                labels: app.port_definitions.iter().map(|def| &def.labels).collect(),
                prefix: PORT_DEFINITION_LABEL_PREFIX,
            })
        } else {
            None
        }
    }
}

/// Converts Marathon apps into target groups, keyed by their source.
pub fn apps_to_target_groups(apps: &AppList) -> HashMap<String, TargetGroup> {
    apps.apps
        .iter()
        .map(|app| {
            let group = create_target_group(app);
            (group.source.clone(), group)
        })
        .collect()
}

/// Builds the group of one app, an app without tasks still gets a group.
pub fn create_target_group(app: &App) -> TargetGroup {
    let mut labels = LabelSet::new();
    labels.insert(APP_LABEL.to_string(), app.id.clone());
    labels.insert(IMAGE_LABEL.to_string(), app.container.docker.image.clone());

    for (name, value) in &app.labels {
        labels.insert(
            format!("{APP_LABEL_PREFIX}{}", sanitize_label_name(name)),
            value.clone(),
        );
    }

    TargetGroup {
        source: app.id.clone(),
        targets: targets_for_app(app),
        labels,
    }
}

/// Every task is reachable at one `host:port` per port, and each of them is
/// a target.
pub fn targets_for_app(app: &App) -> Vec<LabelSet> {
    let app_ports = AppPorts::select(app);
    let container_net = app.is_container_net();
    let mut targets = Vec::with_capacity(app.tasks.len());

    for task in &app.tasks {
        // Without app level ports there are no port labels either, the ports
        // come from the task itself. A task without ports has no targets.
        let (ports, port_labels, prefix) = match &app_ports {
            Some(app_ports) => (
                app_ports.ports.as_slice(),
                app_ports.labels.as_slice(),
                app_ports.prefix,
            ),
            None => (task.ports.as_slice(), &[] as &[&BTreeMap<String, String>], ""),
        };

        for (index, port) in ports.iter().enumerate() {
            let mut target = LabelSet::new();
            target.insert(
                ADDRESS_LABEL.to_string(),
                target_endpoint(task, *port, container_net),
            );
            target.insert(TASK_LABEL.to_string(), task.id.clone());
            target.insert(PORT_INDEX_LABEL.to_string(), index.to_string());

            if let Some(labels) = port_labels.get(index) {
                for (name, value) in labels.iter() {
                    target.insert(
                        format!("{prefix}{}", sanitize_label_name(name)),
                        value.clone(),
                    );
                }
            }

            targets.push(target);
        }
    }

    targets
}

/// Generate a target endpoint string in `host:port` format. Tasks in a
/// container network are reached by their first IP address.
fn target_endpoint(task: &Task, port: u32, container_net: bool) -> String {
    let host = match task.ip_addresses.first() {
        Some(ip) if container_net => ip.address.as_str(),
        _ => task.host.as_str(),
    };

    join_host_port(host, port)
}

fn join_host_port(host: &str, port: u32) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
