//! Orchestration-service instances.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::GroupId;

/// An analysis session grouping related tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "_id")]
    pub id: String,

    pub group_id: GroupId,

    /// Remaining fields, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
