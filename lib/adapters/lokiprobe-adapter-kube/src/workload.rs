use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::Api;
use kube::api::{Patch, PatchParams};

use lokiprobe_domain::{ProcessGroupId, ProcessGroupKind, ProcessGroupStatus, RestartRequest};
use lokiprobe_ports::ProcessGroupPort;

/// Deployments and StatefulSets as restartable process groups.
#[derive(Clone)]
pub struct KubeProcessGroups {
    client: kube::Client,
}

impl KubeProcessGroups {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

pub fn deployment_status(deployment: &Deployment) -> ProcessGroupStatus {
    let desired_replicas = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let status = deployment.status.clone().unwrap_or_default();
    ProcessGroupStatus {
        desired_replicas,
        current_replicas: status.updated_replicas.unwrap_or(0),
        ready_replicas: status.ready_replicas.unwrap_or(0),
        observed_generation: status.observed_generation.unwrap_or(0),
        desired_generation: deployment.metadata.generation.unwrap_or(0),
    }
}

pub fn stateful_set_status(stateful_set: &StatefulSet) -> ProcessGroupStatus {
    let desired_replicas = stateful_set
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let status = stateful_set.status.clone().unwrap_or_default();
    ProcessGroupStatus {
        desired_replicas,
        current_replicas: status.updated_replicas.unwrap_or(0),
        ready_replicas: status.ready_replicas.unwrap_or(0),
        observed_generation: status.observed_generation.unwrap_or(0),
        desired_generation: stateful_set.metadata.generation.unwrap_or(0),
    }
}

#[async_trait]
impl ProcessGroupPort for KubeProcessGroups {
    async fn status(&self, group: &ProcessGroupId) -> Result<ProcessGroupStatus> {
        match group.kind {
            ProcessGroupKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), &group.namespace);
                let deployment = api
                    .get(&group.name)
                    .await
                    .with_context(|| format!("failed to read {group}"))?;
                Ok(deployment_status(&deployment))
            }
            ProcessGroupKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), &group.namespace);
                let stateful_set = api
                    .get(&group.name)
                    .await
                    .with_context(|| format!("failed to read {group}"))?;
                Ok(stateful_set_status(&stateful_set))
            }
        }
    }

    async fn restart(&self, request: &RestartRequest) -> Result<()> {
        let group = &request.group;
        let patch = request.template_patch();
        let params = PatchParams::default();
        match group.kind {
            ProcessGroupKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), &group.namespace);
                api.patch(&group.name, &params, &Patch::Merge(&patch))
                    .await
                    .with_context(|| format!("failed to restart {group}"))?;
            }
            ProcessGroupKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), &group.namespace);
                api.patch(&group.name, &params, &Patch::Merge(&patch))
                    .await
                    .with_context(|| format!("failed to restart {group}"))?;
            }
        }
        tracing::debug!("Patched restart annotation on {group}");
        Ok(())
    }
}
