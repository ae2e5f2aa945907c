//! Request and response shapes of the orchestration and auth services.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warehouse_types::Instance;

/// Filter for `GET /task`.
///
/// `find` is a MongoDB-style filter document, sent JSON-encoded.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub select: Option<String>,
    pub find: Option<Value>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl TaskQuery {
    /// Encode as query parameters.
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref select) = self.select {
            params.push(("select", select.clone()));
        }
        if let Some(ref find) = self.find {
            params.push(("find", find.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }
}

/// Body of `POST /task`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub service: String,
    pub service_branch: String,
    pub instance_id: String,
    /// Maximum runtime in milliseconds.
    pub max_runtime: u64,
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskList<T> {
    #[serde(default = "Vec::new")]
    pub tasks: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstanceList {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmittedTask {
    pub task: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuedJwt {
    pub jwt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_query_params() {
        let query = TaskQuery {
            select: Some("config instance_id".to_string()),
            find: Some(json!({"_group_id": 3})),
            limit: Some(10),
            sort: Some("create_date".to_string()),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("select", "config instance_id".to_string()),
                ("find", r#"{"_group_id":3}"#.to_string()),
                ("limit", "10".to_string()),
                ("sort", "create_date".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_query_has_no_params() {
        assert!(TaskQuery::default().to_params().is_empty());
    }

    #[test]
    fn test_new_task_omits_absent_name() {
        let task = NewTask {
            name: None,
            desc: Some("d".to_string()),
            service: "svc".to_string(),
            service_branch: "master".to_string(),
            instance_id: "i1".to_string(),
            max_runtime: 1000,
            config: json!({}),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("name").is_none());
        assert_eq!(value["desc"], "d");
    }
}
