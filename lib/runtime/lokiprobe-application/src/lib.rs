//! Workflow steps: patch, restart, wait, query, report.

pub mod battery;
pub mod patcher;
pub mod restart;
pub mod results;
pub mod waiter;
pub mod workflow;

#[cfg(test)]
mod fakes;

use std::sync::Arc;

use lokiprobe_ports::{ConfigStorePort, ProcessGroupPort, QueryPort};

pub use battery::{BatteryPlan, QueryBattery};
pub use patcher::ConfigPatcher;
pub use restart::{RestartOutcome, RestartTrigger};
pub use results::ResultsWriter;
pub use waiter::{RolloutWaiter, WaitOutcome};
pub use workflow::Workflow;

/// The external collaborators a workflow talks to.
#[derive(Clone)]
pub struct PortSet {
    pub config_store: Arc<dyn ConfigStorePort>,
    pub process_groups: Arc<dyn ProcessGroupPort>,
    pub queries: Arc<dyn QueryPort>,
}
