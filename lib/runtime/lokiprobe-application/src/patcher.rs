use std::path::Path;
use std::sync::Arc;

use lokiprobe_domain::{ConfigDocument, DocumentRef, Event, ProbeError, ProbeResult};
use lokiprobe_ports::{ConfigStorePort, EventSink};

/// Reads a stored document, deep-merges a fragment into it and writes it back.
#[derive(Clone)]
pub struct ConfigPatcher {
    store: Arc<dyn ConfigStorePort>,
}

impl ConfigPatcher {
    pub fn new(store: Arc<dyn ConfigStorePort>) -> Self {
        Self { store }
    }

    pub async fn merge_and_publish(
        &self,
        document: &DocumentRef,
        fragment_path: &Path,
        sink: &dyn EventSink,
    ) -> ProbeResult<ConfigDocument> {
        let what = fragment_path.display().to_string();
        let fragment_text = tokio::fs::read_to_string(fragment_path)
            .await
            .map_err(|err| ProbeError::io(&what, err))?;
        self.merge_text_and_publish(document, &fragment_text, &what, sink)
            .await
    }

    /// Same as [`Self::merge_and_publish`] for a fragment already in memory.
    pub async fn merge_text_and_publish(
        &self,
        document: &DocumentRef,
        fragment_text: &str,
        fragment_name: &str,
        sink: &dyn EventSink,
    ) -> ProbeResult<ConfigDocument> {
        let current_text = self
            .store
            .read_document(document)
            .await
            .map_err(ProbeError::Platform)?
            .unwrap_or_default();
        let mut merged = ConfigDocument::parse(&current_text, &format!("document {document}"))?;
        let fragment = ConfigDocument::parse(fragment_text, &format!("fragment {fragment_name}"))?;

        merged.merge(fragment);
        let serialized = merged.to_yaml()?;

        self.store
            .write_document(document, serialized)
            .await
            .map_err(ProbeError::Platform)?;
        sink.record(Event::info(format!(
            "Merged {fragment_name} into {document}"
        )));
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeConfigStore;
    use lokiprobe_ports::InMemoryEventSink;

    fn loki_doc() -> DocumentRef {
        DocumentRef::new("loki", "loki", "config.yaml")
    }

    #[tokio::test]
    async fn merged_document_is_published() {
        let store = Arc::new(FakeConfigStore::with_document("a: 1\nb:\n  x: 1\n"));
        let patcher = ConfigPatcher::new(store.clone());
        let sink = InMemoryEventSink::default();

        let merged = patcher
            .merge_text_and_publish(&loki_doc(), "b:\n  y: 2\nc: 3\n", "inline", &sink)
            .await
            .unwrap();

        let expected = ConfigDocument::parse("a: 1\nb:\n  x: 1\n  y: 2\nc: 3\n", "expected").unwrap();
        assert_eq!(merged, expected);
        let written = store.writes();
        assert_eq!(written.len(), 1);
        assert_eq!(ConfigDocument::parse(&written[0], "written").unwrap(), expected);
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn broken_fragment_publishes_nothing() {
        let store = Arc::new(FakeConfigStore::with_document("a: 1\n"));
        let patcher = ConfigPatcher::new(store.clone());

        let err = patcher
            .merge_text_and_publish(&loki_doc(), "b: [oops\n", "inline", &InMemoryEventSink::default())
            .await
            .unwrap_err();

        assert!(err.is_deserialization());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn broken_stored_document_publishes_nothing() {
        let store = Arc::new(FakeConfigStore::with_document("- not\n- a mapping\n"));
        let patcher = ConfigPatcher::new(store.clone());

        let err = patcher
            .merge_text_and_publish(&loki_doc(), "b: 2\n", "inline", &InMemoryEventSink::default())
            .await
            .unwrap_err();

        assert!(err.is_deserialization());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn missing_key_starts_from_empty_document() {
        let store = Arc::new(FakeConfigStore::default());
        let patcher = ConfigPatcher::new(store.clone());

        patcher
            .merge_text_and_publish(&loki_doc(), "c: 3\n", "inline", &InMemoryEventSink::default())
            .await
            .unwrap();

        assert_eq!(
            ConfigDocument::parse(&store.writes()[0], "written").unwrap(),
            ConfigDocument::parse("c: 3\n", "expected").unwrap()
        );
    }

    #[tokio::test]
    async fn fragment_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragment.yaml");
        std::fs::write(&path, "query_range:\n  split_queries_by_interval: 30m\n").unwrap();
        let store = Arc::new(FakeConfigStore::with_document("auth_enabled: true\n"));
        let patcher = ConfigPatcher::new(store.clone());

        let merged = patcher
            .merge_and_publish(&loki_doc(), &path, &InMemoryEventSink::default())
            .await
            .unwrap();

        assert!(merged.get("auth_enabled").is_some());
        assert!(merged.get_path("query_range.split_queries_by_interval").is_some());
    }

    #[tokio::test]
    async fn unreadable_fragment_file_publishes_nothing() {
        let store = Arc::new(FakeConfigStore::with_document("a: 1\n"));
        let patcher = ConfigPatcher::new(store.clone());

        let err = patcher
            .merge_and_publish(
                &loki_doc(),
                Path::new("/nonexistent/fragment.yaml"),
                &InMemoryEventSink::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::Io { .. }));
        assert!(store.writes().is_empty());
    }
}
