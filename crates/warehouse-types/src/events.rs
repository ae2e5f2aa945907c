//! Event publishing seam.
//!
//! The concrete sinks live in `warehouse-server`; the trait is defined here
//! so other crates can publish without depending on the server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::GroupId;

/// Error returned by an event sink.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The sink could not be reached.
    #[error("event transport failed: {0}")]
    Transport(String),

    /// The sink answered with a non-success status.
    #[error("event sink rejected event with status {status}")]
    Rejected { status: u16 },
}

/// Fire-and-forget event sink.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` under `topic`.
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError>;
}

/// Thread-safe shared publisher.
pub type SharedEventPublisher = Arc<dyn EventPublisher>;

/// Audit record emitted after a secondary download completes.
#[derive(Debug, Clone)]
pub struct DownloadEvent {
    pub user_id: String,
    pub group_id: GroupId,
    pub task_id: String,

    /// Request headers of the download.
    pub headers: Value,

    /// Resolved absolute path that was served.
    pub path: String,
}

impl DownloadEvent {
    /// `secondary.download.<user>.<group>.<task>`
    pub fn topic(&self) -> String {
        format!(
            "secondary.download.{}.{}.{}",
            self.user_id, self.group_id, self.task_id
        )
    }

    /// Payload body (`headers` and `path`).
    pub fn payload(&self) -> Value {
        serde_json::json!({
            "headers": self.headers,
            "path": self.path,
        })
    }
}
