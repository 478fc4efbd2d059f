use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use discovery::{ADDRESS_LABEL, TargetGroup};
use serde::Serialize;

/// One entry of a Prometheus `file_sd` document.
#[derive(Debug, PartialEq, Serialize)]
struct StaticConfig<'a> {
    targets: [&'a str; 1],
    labels: BTreeMap<&'a str, &'a str>,
}

/// Tracks the current groups of all sources, and writes them as a file_sd
/// document.
pub struct FileSd {
    path: PathBuf,
    groups: BTreeMap<String, TargetGroup>,
}

impl FileSd {
    pub fn new(path: PathBuf) -> Self {
        FileSd {
            path,
            groups: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the groups of every source in the batch, deletion markers
    /// forget the source.
    pub fn apply(&mut self, batch: Vec<TargetGroup>) {
        for group in batch {
            if group.is_deletion() {
                self.groups.remove(&group.source);
            } else {
                self.groups.insert(group.source.clone(), group);
            }
        }
    }

    fn static_configs(&self) -> Vec<StaticConfig<'_>> {
        let mut configs = vec![];

        for group in self.groups.values() {
            for target in &group.targets {
                let Some(address) = target.get(ADDRESS_LABEL) else {
                    continue;
                };

                let mut labels = group
                    .labels
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect::<BTreeMap<_, _>>();
                labels.extend(
                    target
                        .iter()
                        .filter(|(k, _)| k.as_str() != ADDRESS_LABEL)
                        .map(|(k, v)| (k.as_str(), v.as_str())),
                );

                configs.push(StaticConfig {
                    targets: [address.as_str()],
                    labels,
                });
            }
        }

        configs
    }

    /// Writes the document to a temporary file next to the target, then
    /// renames it, so readers never see a partial document.
    pub async fn flush(&self) -> std::io::Result<()> {
        let data = serde_json::to_vec_pretty(&self.static_configs())?;
        let temp = temp_path(&self.path);

        tokio::fs::write(&temp, data).await?;
        tokio::fs::rename(&temp, &self.path).await
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");

    path.with_file_name(name)
}
