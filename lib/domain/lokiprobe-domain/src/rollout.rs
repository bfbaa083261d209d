use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessGroupKind {
    #[default]
    Deployment,
    StatefulSet,
}

impl fmt::Display for ProcessGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment => f.write_str("deployment"),
            Self::StatefulSet => f.write_str("statefulset"),
        }
    }
}

/// A workload whose replicas are restarted and awaited as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessGroupId {
    #[serde(default)]
    pub kind: ProcessGroupKind,
    pub name: String,
    pub namespace: String,
}

impl ProcessGroupId {
    pub fn deployment(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: ProcessGroupKind::Deployment,
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn stateful_set(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: ProcessGroupKind::StatefulSet,
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ProcessGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// One status snapshot of a process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessGroupStatus {
    pub desired_replicas: i32,
    pub current_replicas: i32,
    pub ready_replicas: i32,
    pub observed_generation: i64,
    pub desired_generation: i64,
}

impl ProcessGroupStatus {
    /// All replicas are current and ready, and the controller has seen the latest spec.
    pub fn is_ready(&self) -> bool {
        self.current_replicas == self.desired_replicas
            && self.ready_replicas == self.desired_replicas
            && self.observed_generation >= self.desired_generation
    }

    pub fn progress_line(&self) -> String {
        format!(
            "{}/{} updated, {}/{} ready, generation {}/{}",
            self.current_replicas,
            self.desired_replicas,
            self.ready_replicas,
            self.desired_replicas,
            self.observed_generation,
            self.desired_generation
        )
    }
}

/// A request to roll every replica of a group by stamping its pod template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    pub group: ProcessGroupId,
    pub restarted_at: DateTime<Utc>,
}

impl RestartRequest {
    pub fn new(group: ProcessGroupId, restarted_at: DateTime<Utc>) -> Self {
        Self {
            group,
            restarted_at,
        }
    }

    pub fn now(group: ProcessGroupId) -> Self {
        Self::new(group, Utc::now())
    }

    pub fn annotation_value(&self) -> String {
        self.restarted_at.to_rfc3339()
    }

    /// Merge patch body that sets the restart annotation on the pod template.
    pub fn template_patch(&self) -> serde_json::Value {
        serde_json::json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            RESTARTED_AT_ANNOTATION: self.annotation_value()
                        }
                    }
                }
            }
        })
    }
}
