//! In-memory ports for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::time::Instant;

use lokiprobe_domain::{
    DocumentRef, ProcessGroupId, ProcessGroupStatus, QueryRequest, RestartRequest,
};
use lokiprobe_ports::{ConfigStorePort, ProcessGroupPort, QueryPort};

#[derive(Default)]
pub struct FakeConfigStore {
    current: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
}

impl FakeConfigStore {
    pub fn with_document(text: &str) -> Self {
        Self {
            current: Mutex::new(Some(text.to_string())),
            writes: Mutex::default(),
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStorePort for FakeConfigStore {
    async fn read_document(&self, _document: &DocumentRef) -> Result<Option<String>> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn write_document(&self, _document: &DocumentRef, contents: String) -> Result<()> {
        *self.current.lock().unwrap() = Some(contents.clone());
        self.writes.lock().unwrap().push(contents);
        Ok(())
    }
}

/// Replays a scripted status sequence per group; the last entry repeats.
#[derive(Default)]
pub struct FakeProcessGroups {
    scripts: Mutex<HashMap<ProcessGroupId, VecDeque<ProcessGroupStatus>>>,
    polls: Mutex<Vec<(ProcessGroupId, Instant)>>,
    restarts: Mutex<Vec<ProcessGroupId>>,
    failing_restarts: HashSet<ProcessGroupId>,
}

impl FakeProcessGroups {
    pub fn script(self, group: &ProcessGroupId, statuses: Vec<ProcessGroupStatus>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(group.clone(), statuses.into());
        self
    }

    pub fn failing_restart(mut self, group: &ProcessGroupId) -> Self {
        self.failing_restarts.insert(group.clone());
        self
    }

    pub fn poll_times(&self, group: &ProcessGroupId) -> Vec<Instant> {
        self.polls
            .lock()
            .unwrap()
            .iter()
            .filter(|(polled, _)| polled == group)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn restarts(&self) -> Vec<ProcessGroupId> {
        self.restarts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessGroupPort for FakeProcessGroups {
    async fn status(&self, group: &ProcessGroupId) -> Result<ProcessGroupStatus> {
        self.polls
            .lock()
            .unwrap()
            .push((group.clone(), Instant::now()));
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(group)
            .ok_or_else(|| anyhow!("{group} not found"))?;
        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().copied()
        };
        status.ok_or_else(|| anyhow!("{group} has no scripted status"))
    }

    async fn restart(&self, request: &RestartRequest) -> Result<()> {
        if self.failing_restarts.contains(&request.group) {
            return Err(anyhow!("deployments.apps \"{}\" not found", request.group.name));
        }
        self.restarts.lock().unwrap().push(request.group.clone());
        Ok(())
    }
}

/// Answers queries from a fixed cycle of outcomes; `Err` simulates transport failure.
pub struct FakeQueryPort {
    outcomes: Vec<std::result::Result<u16, String>>,
    sent: Mutex<Vec<QueryRequest>>,
}

impl FakeQueryPort {
    pub fn new(outcomes: Vec<std::result::Result<u16, String>>) -> Self {
        Self {
            outcomes,
            sent: Mutex::default(),
        }
    }

    pub fn sent(&self) -> Vec<QueryRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryPort for FakeQueryPort {
    async fn send(&self, request: &QueryRequest) -> Result<u16> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len() % self.outcomes.len().max(1);
        sent.push(request.clone());
        match self.outcomes.get(index) {
            Some(Ok(code)) => Ok(*code),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Ok(200),
        }
    }
}

pub fn not_ready(desired: i32, ready: i32) -> ProcessGroupStatus {
    ProcessGroupStatus {
        desired_replicas: desired,
        current_replicas: desired,
        ready_replicas: ready,
        observed_generation: 2,
        desired_generation: 2,
    }
}

pub fn ready(desired: i32) -> ProcessGroupStatus {
    not_ready(desired, desired)
}
