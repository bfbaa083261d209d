use std::sync::Arc;

use lokiprobe_domain::{Event, ProcessGroupId, RestartRequest};
use lokiprobe_ports::{EventSink, ProcessGroupPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// The platform refused; the rollout may or may not have started.
    Failed(String),
}

impl RestartOutcome {
    pub fn is_restarted(&self) -> bool {
        matches!(self, Self::Restarted)
    }
}

/// Stamps the restart annotation onto a group's pod template.
#[derive(Clone)]
pub struct RestartTrigger {
    groups: Arc<dyn ProcessGroupPort>,
}

impl RestartTrigger {
    pub fn new(groups: Arc<dyn ProcessGroupPort>) -> Self {
        Self { groups }
    }

    /// Failures are recorded and returned, never raised.
    pub async fn restart(&self, group: &ProcessGroupId, sink: &dyn EventSink) -> RestartOutcome {
        let request = RestartRequest::now(group.clone());
        match self.groups.restart(&request).await {
            Ok(()) => {
                sink.record(Event::info(format!(
                    "Restarted {group} at {}",
                    request.annotation_value()
                )));
                RestartOutcome::Restarted
            }
            Err(err) => {
                sink.record(Event::warn(format!("Restart of {group} failed: {err:#}")));
                RestartOutcome::Failed(err.to_string())
            }
        }
    }
}
