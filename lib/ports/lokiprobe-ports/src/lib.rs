//! Boundaries between the workflow and the outside world.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use lokiprobe_domain::{
    DocumentRef, Event, EventLevel, ProcessGroupId, ProcessGroupStatus, QueryRequest,
    RestartRequest,
};

/// Raw access to serialized configuration documents.
#[async_trait]
pub trait ConfigStorePort: Send + Sync {
    /// Returns `None` when the object exists but holds nothing under the key.
    async fn read_document(&self, document: &DocumentRef) -> Result<Option<String>>;
    async fn write_document(&self, document: &DocumentRef, contents: String) -> Result<()>;
}

#[async_trait]
pub trait ProcessGroupPort: Send + Sync {
    async fn status(&self, group: &ProcessGroupId) -> Result<ProcessGroupStatus>;
    async fn restart(&self, request: &RestartRequest) -> Result<()>;
}

#[async_trait]
pub trait QueryPort: Send + Sync {
    /// Send one request and return the HTTP status; transport failures are errors.
    async fn send(&self, request: &QueryRequest) -> Result<u16>;
}

/// Destination for workflow observations.
pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
}

/// Forwards events to `tracing` at the matching level.
#[derive(Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: Event) {
        match event.level {
            EventLevel::Debug => tracing::debug!("{}", event.message),
            EventLevel::Info => tracing::info!("{}", event.message),
            EventLevel::Warn => tracing::warn!("{}", event.message),
            EventLevel::Error => tracing::error!("{}", event.message),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl InMemoryEventSink {
    pub fn events(&self) -> Vec<Event> {
        if let Ok(guard) = self.events.lock() {
            guard.clone()
        } else {
            Vec::new()
        }
    }

    pub fn messages_at(&self, level: EventLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .map(|event| event.message)
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: Event) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&self, _event: Event) {}
}
