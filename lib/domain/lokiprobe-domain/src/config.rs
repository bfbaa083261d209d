//! Run configuration loaded from YAML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::document::DocumentRef;
use crate::error::ProbeError;
use crate::query::{QueryTemplate, TimeWindow};
use crate::rollout::ProcessGroupId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    pub config_map: ConfigMapConfig,
    #[serde(default)]
    pub process_groups: Vec<ProcessGroupId>,
    #[validate(length(min = 1, message = "at least one variant is required"))]
    pub variants: Vec<VariantConfig>,
    #[serde(default)]
    #[validate(nested)]
    pub rollout: RolloutConfig,
    pub loki: LokiConfig,
    #[validate(nested)]
    pub queries: QueriesConfig,
    #[serde(default)]
    pub results: ResultsConfig,
}

impl ProbeConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let mut config: ProbeConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ProbeError> {
        self.validate()
            .map_err(|errors| ProbeError::Config(errors.to_string()))
    }

    /// Fragment and results paths are relative to the config file that names them.
    fn resolve_relative_paths(&mut self, base: &Path) {
        for variant in &mut self.variants {
            if variant.fragment.is_relative() {
                variant.fragment = base.join(&variant.fragment);
            }
        }
        if self.results.path.is_relative() {
            self.results.path = base.join(&self.results.path);
        }
    }

    pub fn document_ref(&self) -> DocumentRef {
        DocumentRef::new(
            &self.config_map.name,
            &self.config_map.namespace,
            &self.config_map.key,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapConfig {
    pub name: String,
    pub namespace: String,
    #[serde(default = "default_config_key")]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    pub fragment: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RolloutConfig {
    #[serde(default = "default_poll_interval_secs")]
    #[validate(range(min = 1))]
    pub poll_interval_secs: u64,
    #[serde(default = "default_rollout_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub settle_secs: u64,
}

impl RolloutConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_rollout_timeout_secs(),
            settle_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokiConfig {
    pub url: String,
    pub tenant: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "patterns_cover_templates"))]
pub struct QueriesConfig {
    #[validate(length(min = 1))]
    pub templates: Vec<QueryTemplate>,
    #[validate(length(min = 1))]
    pub windows: Vec<TimeWindow>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_repetitions")]
    #[validate(range(min = 1))]
    pub repetitions: u32,
    #[serde(default = "default_true")]
    pub record_counts: bool,
}

/// Where reports go. A relative `path` is resolved against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsConfig {
    #[serde(default = "default_results_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub dashboard_url: Option<String>,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            path: default_results_path(),
            dashboard_url: None,
        }
    }
}

/// A `{pattern}` template needs at least one pattern to substitute.
fn patterns_cover_templates(queries: &QueriesConfig) -> Result<(), ValidationError> {
    if !queries.patterns.is_empty() {
        return Ok(());
    }
    match queries.templates.iter().find(|template| template.uses_pattern()) {
        Some(template) => Err(ValidationError::new("patterns_required").with_message(
            format!("template `{}` uses {{pattern}} but no patterns are configured", template.name)
                .into(),
        )),
        None => Ok(()),
    }
}

fn default_config_key() -> String {
    "config.yaml".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_rollout_timeout_secs() -> u64 {
    600
}

fn default_limit() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_repetitions() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_results_path() -> PathBuf {
    PathBuf::from("results.txt")
}
