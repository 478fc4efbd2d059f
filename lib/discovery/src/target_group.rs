use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix for labels that carry discovery metadata, they are expected to be
/// dropped or relabeled by the consumer.
pub const META_LABEL_PREFIX: &str = "__meta_";

/// The label holding the `host:port` of a target, every target has one.
pub const ADDRESS_LABEL: &str = "__address__";

/// Labels are kept sorted, so equal groups always render the same way.
pub type LabelSet = BTreeMap<String, String>;

/// TargetGroup is a set of targets with a common tags
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TargetGroup {
    /// An identifier that describes a group of targets, it is stable across
    /// refreshes.
    pub source: String,

    /// `targets` is a list of targets identified by a label set. Each target
    /// is uniquely identifiable in the group by its `address` label
    #[serde(default)]
    pub targets: Vec<LabelSet>,

    /// `labels` is a set of labels that is common across all targets in the group
    #[serde(default)]
    pub labels: LabelSet,
}

impl TargetGroup {
    /// A group without targets and labels, which tells the consumer that
    /// everything announced for `source` so far is gone.
    pub fn deleted(source: impl Into<String>) -> Self {
        TargetGroup {
            source: source.into(),
            targets: vec![],
            labels: LabelSet::new(),
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.targets.is_empty() && self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_marker() {
        let group = TargetGroup::deleted("/app1");
        assert!(group.is_deletion());
        assert_eq!(
            serde_json::to_string(&group).unwrap(),
            r#"{"source":"/app1","targets":[],"labels":{}}"#
        );
    }

    #[test]
    fn labels_make_a_group_live() {
        let mut group = TargetGroup::deleted("/app1");
        group.labels.insert("foo".into(), "bar".into());
        assert!(!group.is_deletion());
    }
}
