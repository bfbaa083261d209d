//! Kubernetes-backed ports.

pub mod config_map;
pub mod workload;

use anyhow::{Context, Result};

pub use config_map::KubeConfigStore;
pub use workload::{KubeProcessGroups, deployment_status, stateful_set_status};

/// Client from the ambient kubeconfig or in-cluster service account.
pub async fn connect() -> Result<kube::Client> {
    kube::Client::try_default()
        .await
        .context("failed to create kube client")
}
