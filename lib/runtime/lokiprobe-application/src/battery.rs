//! The query matrix fired after each rollout.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use lokiprobe_domain::{
    Event, QueriesConfig, QueryRequest, QueryTally, QueryTemplate, TimeWindow,
};
use lokiprobe_ports::{EventSink, QueryPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryPlan {
    pub templates: Vec<QueryTemplate>,
    pub windows: Vec<TimeWindow>,
    pub patterns: Vec<String>,
    pub repetitions: u32,
    pub limit: u32,
}

impl BatteryPlan {
    pub fn from_config(queries: &QueriesConfig, limit: u32) -> Self {
        Self {
            templates: queries.templates.clone(),
            windows: queries.windows.clone(),
            patterns: queries.patterns.clone(),
            repetitions: queries.repetitions,
            limit,
        }
    }

    /// Every template against every window; pattern templates once per pattern
    /// and not at all when no patterns are configured.
    pub fn expand(&self, end: DateTime<Utc>) -> Vec<QueryRequest> {
        let mut requests = Vec::new();
        for template in &self.templates {
            for window in &self.windows {
                let start = window_start(end, window);
                let patterns: Vec<Option<&str>> = if template.uses_pattern() {
                    self.patterns.iter().map(|p| Some(p.as_str())).collect()
                } else {
                    vec![None]
                };
                for pattern in patterns {
                    requests.push(QueryRequest {
                        template: template.name.clone(),
                        kind: template.kind,
                        expr: template.render(window, pattern),
                        window: window.clone(),
                        pattern: pattern.map(str::to_string),
                        start,
                        end,
                        limit: self.limit,
                    });
                }
            }
        }
        requests
    }
}

/// Start of the lookback, clamped to the earliest representable instant.
fn window_start(end: DateTime<Utc>, window: &TimeWindow) -> DateTime<Utc> {
    i64::try_from(window.duration().as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lookback| end.checked_sub_signed(lookback))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Sends the expanded matrix one request at a time and tallies the statuses.
#[derive(Clone)]
pub struct QueryBattery {
    port: Arc<dyn QueryPort>,
    plan: BatteryPlan,
}

impl QueryBattery {
    pub fn new(port: Arc<dyn QueryPort>, plan: BatteryPlan) -> Self {
        Self { port, plan }
    }

    pub fn plan(&self) -> &BatteryPlan {
        &self.plan
    }

    pub async fn run(&self, sink: &dyn EventSink) -> QueryTally {
        let mut tally = QueryTally::default();
        for round in 1..=self.plan.repetitions {
            let requests = self.plan.expand(Utc::now());
            sink.record(Event::info(format!(
                "Query round {round}: {} requests",
                requests.len()
            )));
            for request in &requests {
                tally.absorb(self.send_one(request, sink).await);
            }
        }
        sink.record(Event::info(format!(
            "Queries finished: {} ok, {} failed",
            tally.success, tally.errors
        )));
        tally
    }

    async fn send_one(&self, request: &QueryRequest, sink: &dyn EventSink) -> QueryTally {
        let mut tally = QueryTally::default();
        match self.port.send(request).await {
            Ok(code) => {
                if tally.record(Some(code)) {
                    sink.record(Event::debug(format!("{} -> {code}", request.describe())));
                } else {
                    sink.record(Event::warn(format!("{} -> {code}", request.describe())));
                }
            }
            Err(err) => {
                tally.record(None);
                sink.record(Event::warn(format!("{} failed: {err:#}", request.describe())));
            }
        }
        tally
    }
}
