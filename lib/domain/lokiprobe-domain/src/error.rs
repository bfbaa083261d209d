use std::time::Duration;

use crate::rollout::ProcessGroupId;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Failures the workflow needs to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to deserialize {what}: {source}")]
    Deserialization {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialization(#[source] serde_yaml::Error),

    #[error("{what} is not a mapping")]
    NotAMapping { what: String },

    #[error("timed out after {waited:?} waiting for {group} to become ready")]
    Timeout { group: ProcessGroupId, waited: Duration },

    #[error("platform call failed: {0:#}")]
    Platform(anyhow::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProbeError {
    pub fn deserialization(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Deserialization {
            what: what.into(),
            source,
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the parse failures that must stop a patch before publishing.
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Self::Deserialization { .. } | Self::NotAMapping { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
