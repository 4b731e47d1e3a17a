//! Partial-update changesets

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One partial-update instruction
///
/// Identifies its target either by `id` or by `foreign_id` plus `time`, then
/// lists fields to set and dotted paths to unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unset: Option<Vec<String>>,
}

impl Changeset {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    pub fn by_foreign_id(foreign_id: impl Into<String>, time: impl Into<String>) -> Self {
        Self { foreign_id: Some(foreign_id.into()), time: Some(time.into()), ..Self::default() }
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.get_or_insert_with(Map::new).insert(field.into(), value);
        self
    }

    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.unset.get_or_insert_with(Vec::new).push(path.into());
        self
    }

    /// `true` when the changeset names its target exactly one way.
    pub fn is_identified(&self) -> bool {
        self.id.is_some() != (self.foreign_id.is_some() && self.time.is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_only_present_fields() {
        let change = Changeset::by_id("abc").set("x", json!(1));
        assert_eq!(serde_json::to_value(&change).unwrap(), json!({"id": "abc", "set": {"x": 1}}));
    }

    #[test]
    fn foreign_id_requires_time() {
        assert!(Changeset::by_foreign_id("post:1", "2024-01-01T00:00:00").is_identified());
        let partial = Changeset { foreign_id: Some("post:1".into()), ..Changeset::default() };
        assert!(!partial.is_identified());
        assert!(!Changeset::default().is_identified());
        let both = Changeset { id: Some("abc".into()), ..Changeset::by_foreign_id("post:1", "t") };
        assert!(!both.is_identified());
    }

    #[test]
    fn unset_accumulates_paths() {
        let change = Changeset::by_id("abc").unset("a").unset("b.c");
        assert_eq!(change.unset, Some(vec!["a".to_string(), "b.c".to_string()]));
    }
}
