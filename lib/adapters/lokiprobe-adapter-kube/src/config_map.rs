use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use kube::api::{Patch, PatchParams};
use serde_json::{Map, Value, json};

use lokiprobe_domain::DocumentRef;
use lokiprobe_ports::ConfigStorePort;

/// Documents stored as ConfigMap data entries.
#[derive(Clone)]
pub struct KubeConfigStore {
    client: kube::Client,
}

impl KubeConfigStore {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Merge patch replacing a single data key; other keys are left alone.
pub fn data_patch(key: &str, contents: String) -> Value {
    let mut data = Map::new();
    data.insert(key.to_string(), Value::String(contents));
    json!({ "data": data })
}

#[async_trait]
impl ConfigStorePort for KubeConfigStore {
    async fn read_document(&self, document: &DocumentRef) -> Result<Option<String>> {
        let config_map = self
            .api(&document.namespace)
            .get(&document.name)
            .await
            .with_context(|| format!("failed to read configmap {document}"))?;
        Ok(config_map
            .data
            .and_then(|mut data| data.remove(&document.key)))
    }

    async fn write_document(&self, document: &DocumentRef, contents: String) -> Result<()> {
        let patch = data_patch(&document.key, contents);
        self.api(&document.namespace)
            .patch(&document.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to write configmap {document}"))?;
        tracing::debug!("Published {document}");
        Ok(())
    }
}
