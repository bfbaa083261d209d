//! Structured configuration documents and the recursive merge applied to them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{ProbeError, ProbeResult};

/// Identity of a serialized document stored under one ConfigMap data key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub namespace: String,
    pub key: String,
}

impl DocumentRef {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.namespace, self.name, self.key)
    }
}

/// A nested mapping loaded from YAML. The root is always a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    pub fn empty() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
        }
    }

    /// Parse `text`, naming the source as `what` in any error.
    ///
    /// Blank input yields an empty mapping; any other non-mapping root is rejected.
    pub fn parse(text: &str, what: &str) -> ProbeResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let root: Value =
            serde_yaml::from_str(text).map_err(|err| ProbeError::deserialization(what, err))?;
        match root {
            Value::Null => Ok(Self::empty()),
            Value::Mapping(_) => Ok(Self { root }),
            _ => Err(ProbeError::NotAMapping {
                what: what.to_string(),
            }),
        }
    }

    pub fn to_yaml(&self) -> ProbeResult<String> {
        serde_yaml::to_string(&self.root).map_err(ProbeError::Serialization)
    }

    /// Merge `fragment` into this document; the fragment wins on scalar conflicts.
    pub fn merge(&mut self, fragment: ConfigDocument) {
        merge_values(&mut self.root, fragment.root);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Follow a dotted path such as `limits_config.max_query_series`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |value, segment| value.get(segment))
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::empty()
    }
}

/// Combine mappings key by key; anything else at a shared key is replaced.
pub fn merge_values(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Mapping(base_map), Value::Mapping(incoming_map)) => {
            for (key, value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ConfigDocument {
        ConfigDocument::parse(text, "test").expect("valid yaml")
    }

    #[test]
    fn merge_combines_nested_mappings() {
        let mut base = doc("a: 1\nb:\n  x: 1\n");
        base.merge(doc("b:\n  y: 2\nc: 3\n"));
        assert_eq!(base, doc("a: 1\nb:\n  x: 1\n  y: 2\nc: 3\n"));
    }

    #[test]
    fn incoming_scalar_wins() {
        let mut base = doc("a: 1\nb: keep\n");
        base.merge(doc("a: 2\n"));
        assert_eq!(base.get("a"), Some(&Value::from(2)));
        assert_eq!(base.get("b"), Some(&Value::from("keep")));
    }

    #[test]
    fn nested_conflicts_take_incoming_value() {
        let mut base = doc("limits:\n  max_series: 500\n  max_lines: 10\n");
        base.merge(doc("limits:\n  max_series: 5000\n  split: 30m\n"));
        assert_eq!(
            base.get_path("limits.max_series"),
            Some(&Value::from(5000))
        );
        assert_eq!(base.get_path("limits.max_lines"), Some(&Value::from(10)));
        assert_eq!(base.get_path("limits.split"), Some(&Value::from("30m")));
    }

    #[test]
    fn disjoint_fragments_merge_in_either_order() {
        let first = doc("x:\n  a: 1\n");
        let second = doc("y: [1, 2]\nz:\n  b: 2\n");

        let mut left = doc("base: true\n");
        left.merge(first.clone());
        left.merge(second.clone());

        let mut right = doc("base: true\n");
        right.merge(second);
        right.merge(first);

        assert_eq!(left, right);
    }

    #[test]
    fn sequences_are_replaced_not_appended() {
        let mut base = doc("peers: [a, b]\n");
        base.merge(doc("peers: [c]\n"));
        assert_eq!(base, doc("peers: [c]\n"));
    }

    #[test]
    fn mapping_replaces_scalar_and_scalar_replaces_mapping() {
        let mut base = doc("a: 1\nb:\n  x: 1\n");
        base.merge(doc("a:\n  nested: true\nb: flat\n"));
        assert_eq!(base, doc("a:\n  nested: true\nb: flat\n"));
    }

    #[test]
    fn blank_text_is_an_empty_document() {
        assert_eq!(doc(""), ConfigDocument::empty());
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = ConfigDocument::parse("- a\n- b\n", "fragment").unwrap_err();
        assert!(err.is_deserialization());
    }

    #[test]
    fn malformed_yaml_is_a_deserialization_error() {
        let err = ConfigDocument::parse("a: [unclosed\n", "fragment").unwrap_err();
        assert!(matches!(err, ProbeError::Deserialization { .. }));
    }

    #[test]
    fn serialized_document_parses_back_to_itself() {
        let original = doc("a: 1\nb:\n  x: [1, 2]\n");
        let text = original.to_yaml().unwrap();
        assert_eq!(doc(&text), original);
    }
}
