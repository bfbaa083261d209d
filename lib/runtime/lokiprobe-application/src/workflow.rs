//! One parametrized load run: patch, restart, wait, query, report.

use chrono::Utc;
use tokio::time::sleep;

use lokiprobe_domain::{
    DocumentRef, Event, ProbeConfig, ProbeResult, ProcessGroupId, RolloutConfig, RunReport,
    VariantConfig,
};
use lokiprobe_ports::EventSink;

use crate::battery::{BatteryPlan, QueryBattery};
use crate::patcher::ConfigPatcher;
use crate::restart::RestartTrigger;
use crate::results::ResultsWriter;
use crate::waiter::RolloutWaiter;
use crate::PortSet;

pub struct Workflow {
    document: DocumentRef,
    groups: Vec<ProcessGroupId>,
    rollout: RolloutConfig,
    record_counts: bool,
    dashboard_url: Option<String>,
    patcher: ConfigPatcher,
    restarter: RestartTrigger,
    waiter: RolloutWaiter,
    battery: QueryBattery,
    results: ResultsWriter,
}

impl Workflow {
    pub fn new(config: &ProbeConfig, ports: PortSet) -> Self {
        Self {
            document: config.document_ref(),
            groups: config.process_groups.clone(),
            rollout: config.rollout,
            record_counts: config.queries.record_counts,
            dashboard_url: config.results.dashboard_url.clone(),
            patcher: ConfigPatcher::new(ports.config_store),
            restarter: RestartTrigger::new(ports.process_groups.clone()),
            waiter: RolloutWaiter::new(ports.process_groups, config.rollout.poll_interval()),
            battery: QueryBattery::new(
                ports.queries,
                BatteryPlan::from_config(&config.queries, config.loki.limit),
            ),
            results: ResultsWriter::new(&config.results.path),
        }
    }

    /// Run every variant in order. Parse and timeout failures stop the run.
    pub async fn run(
        &self,
        variants: &[VariantConfig],
        sink: &dyn EventSink,
    ) -> ProbeResult<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(variants.len());
        for variant in variants {
            reports.push(self.run_variant(variant, sink).await?);
        }
        Ok(reports)
    }

    pub async fn run_variant(
        &self,
        variant: &VariantConfig,
        sink: &dyn EventSink,
    ) -> ProbeResult<RunReport> {
        sink.record(Event::info(format!("Starting variant {}", variant.name)));
        let started_at = Utc::now();

        self.patcher
            .merge_and_publish(&self.document, &variant.fragment, sink)
            .await?;
        self.roll_groups(sink).await?;

        if !self.rollout.settle().is_zero() {
            sink.record(Event::info(format!(
                "Settling for {:?}",
                self.rollout.settle()
            )));
            sleep(self.rollout.settle()).await;
        }

        let tally = self.battery.run(sink).await;
        let report = RunReport {
            variant: variant.name.clone(),
            tally: self.record_counts.then_some(tally),
            started_at,
            finished_at: Utc::now(),
            dashboard_url: self.dashboard_url.clone(),
        };
        self.results.append(&report).await?;
        sink.record(Event::info(format!(
            "Variant {} recorded in {}",
            variant.name,
            self.results.path().display()
        )));
        Ok(report)
    }

    /// Restart every group first, then wait on each in turn.
    pub async fn roll_groups(&self, sink: &dyn EventSink) -> ProbeResult<()> {
        for group in &self.groups {
            self.restarter.restart(group, sink).await;
        }
        for group in &self.groups {
            self.waiter
                .wait_for_ready(group, self.rollout.timeout(), sink)
                .await?;
        }
        Ok(())
    }
}
