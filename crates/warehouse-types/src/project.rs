//! Project records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::GroupId;

/// A project document keyed by its group.
///
/// Only `_id` and `group_id` are interpreted. Everything else is carried
/// verbatim so the full document can be handed to the group-analysis
/// launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,

    pub group_id: GroupId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Create a bare project.
    pub fn new(id: impl Into<String>, group_id: GroupId) -> Self {
        Self {
            id: id.into(),
            group_id,
            name: None,
            desc: None,
            extra: Map::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let doc = json!({
            "_id": "p1",
            "group_id": 7,
            "name": "Test",
            "admins": ["u1"],
            "access": "private",
        });
        let project: Project = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.group_id, 7);
        assert_eq!(project.extra.get("access"), Some(&json!("private")));
        assert_eq!(serde_json::to_value(&project).unwrap(), doc);
    }
}
