//! Orchestration-service tasks.
//!
//! The orchestration service owns these records; the warehouse only reads
//! them. Every field is optional because listing queries select a subset.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GroupId;

/// A task as returned by `GET /task/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_group_id", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "crate::de::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps_config: Vec<DepConfig>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
}

impl Task {
    /// The task this one follows (first dependency), if any.
    pub fn followed_task_id(&self) -> Option<&str> {
        self.deps_config.first().map(|dep| dep.task.as_str())
    }

    /// Whether `user_id` owns this task.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// One upstream dependency of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepConfig {
    pub task: String,
}

/// A completed archival task, as selected by the secondary listing query
/// (`select=config instance_id`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveTask {
    #[serde(default)]
    pub instance_id: Option<String>,

    #[serde(default)]
    pub config: Option<ArchiveConfig>,
}

impl ArchiveTask {
    /// Output requests, or `None` for tasks written before requests existed.
    pub fn requests(&self) -> Option<&[OutputRequest]> {
        self.config.as_ref()?.requests.as_deref()
    }
}

/// The part of an archival task's config the warehouse reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub requests: Option<Vec<OutputRequest>>,
}

/// A single archived output inside an archival task's config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputRequest {
    #[serde(default)]
    pub instance_id: Option<String>,

    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(default)]
    pub subdir: Option<String>,

    /// Datatype document or id. Absent on incomplete requests.
    #[serde(default)]
    pub datatype: Option<Value>,

    #[serde(default)]
    pub app: Value,

    #[serde(default)]
    pub output: Value,

    #[serde(default)]
    pub finish_date: Value,
}

impl OutputRequest {
    /// Archive-relative location: `instance_id/task_id/subdir`.
    pub fn secondary_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.instance_id.as_deref().unwrap_or_default(),
            self.task_id.as_deref().unwrap_or_default(),
            self.subdir.as_deref().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_service_payload() {
        let task: Task = serde_json::from_value(json!({
            "_id": "t9",
            "_group_id": 12,
            "instance_id": "i1",
            "user_id": 5,
            "deps_config": [{"task": "t1"}, {"task": "t2"}],
            "config": {"requests": []},
            "status": "finished",
        }))
        .unwrap();

        assert_eq!(task.id.as_deref(), Some("t9"));
        assert_eq!(task.group_id, Some(12));
        assert_eq!(task.followed_task_id(), Some("t1"));
        assert!(task.is_owned_by("5"));
        assert!(!task.is_owned_by("6"));
    }

    #[test]
    fn test_task_without_deps() {
        let task: Task = serde_json::from_value(json!({"_id": "t9"})).unwrap();
        assert_eq!(task.followed_task_id(), None);
        assert!(!task.is_owned_by("anyone"));
    }

    #[test]
    fn test_archive_task_without_requests() {
        let old: ArchiveTask =
            serde_json::from_value(json!({"instance_id": "i1", "config": {"validator": 1}}))
                .unwrap();
        assert!(old.requests().is_none());

        let bare: ArchiveTask = serde_json::from_value(json!({"config": null})).unwrap();
        assert!(bare.requests().is_none());
    }

    #[test]
    fn test_secondary_path() {
        let request: OutputRequest = serde_json::from_value(json!({
            "instance_id": "i1",
            "task_id": "t1",
            "subdir": "out",
            "datatype": "d1",
        }))
        .unwrap();
        assert_eq!(request.secondary_path(), "i1/t1/out");
    }

    #[test]
    fn test_null_datatype_is_absent() {
        let request: OutputRequest =
            serde_json::from_value(json!({"task_id": "t1", "datatype": null})).unwrap();
        assert!(request.datatype.is_none());
    }
}
