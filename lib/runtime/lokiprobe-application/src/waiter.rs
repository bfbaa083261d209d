//! Readiness polling for restarted process groups.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use lokiprobe_domain::{Event, ProbeError, ProbeResult, ProcessGroupId};
use lokiprobe_ports::{EventSink, ProcessGroupPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    pub ticks: u32,
    pub waited: Duration,
}

/// Polls a group's status on a fixed interval until it reports ready.
#[derive(Clone)]
pub struct RolloutWaiter {
    groups: Arc<dyn ProcessGroupPort>,
    poll_interval: Duration,
}

impl RolloutWaiter {
    pub fn new(groups: Arc<dyn ProcessGroupPort>, poll_interval: Duration) -> Self {
        Self {
            groups,
            poll_interval,
        }
    }

    /// Block until `group` is ready or `timeout` has elapsed since the call.
    ///
    /// The first tick is immediate. Sleeps are clipped to the deadline, so no
    /// status is fetched once the deadline has passed.
    pub async fn wait_for_ready(
        &self,
        group: &ProcessGroupId,
        timeout: Duration,
        sink: &dyn EventSink,
    ) -> ProbeResult<WaitOutcome> {
        let started = Instant::now();
        let mut ticks = 0u32;

        loop {
            if started.elapsed() > timeout {
                return Err(self.timed_out(group, started, sink));
            }

            let status = self
                .groups
                .status(group)
                .await
                .map_err(ProbeError::Platform)?;
            ticks += 1;

            if status.is_ready() {
                let waited = started.elapsed();
                sink.record(Event::info(format!(
                    "{group} ready after {ticks} checks ({waited:?})"
                )));
                return Ok(WaitOutcome { ticks, waited });
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(self.timed_out(group, started, sink));
            }

            sink.record(Event::info(format!(
                "Waiting for {group}: {}",
                status.progress_line()
            )));
            sleep(self.poll_interval.min(timeout - waited)).await;
        }
    }

    fn timed_out(&self, group: &ProcessGroupId, started: Instant, sink: &dyn EventSink) -> ProbeError {
        let waited = started.elapsed();
        sink.record(Event::error(format!(
            "{group} not ready after {waited:?}"
        )));
        ProbeError::Timeout {
            group: group.clone(),
            waited,
        }
    }
}
