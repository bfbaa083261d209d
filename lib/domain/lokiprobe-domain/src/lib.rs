//! Domain models and invariants.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod query;
pub mod report;
pub mod rollout;

pub use config::{
    ConfigMapConfig, LokiConfig, ProbeConfig, QueriesConfig, ResultsConfig, RolloutConfig,
    VariantConfig,
};
pub use document::{ConfigDocument, DocumentRef, merge_values};
pub use error::{ProbeError, ProbeResult};
pub use events::{Event, EventLevel, now_millis};
pub use query::{
    QueryKind, QueryRequest, QueryTally, QueryTemplate, TimeWindow, is_success_status,
};
pub use report::RunReport;
pub use rollout::{ProcessGroupId, ProcessGroupKind, ProcessGroupStatus, RestartRequest};
