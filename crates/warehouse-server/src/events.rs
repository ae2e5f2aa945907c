//! Event publishers.
//!
//! Publication is fire-and-forget: [`spawn_publish`] runs it on its own task,
//! so a failing sink can only produce a log line.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use warehouse_types::{EventPublisher, PublishError, SharedEventPublisher};

/// Writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        tracing::info!(target: "warehouse::events", topic, %payload, "Event published");
        Ok(())
    }
}

/// Discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _payload: &Value) -> Result<(), PublishError> {
        Ok(())
    }
}

/// POSTs `{topic, payload, published_at}` to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpPublisher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        let body = json!({
            "topic": topic,
            "payload": payload,
            "published_at": Utc::now().to_rfc3339(),
        });
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Publish in the background; failures are logged and dropped.
pub fn spawn_publish(publisher: SharedEventPublisher, topic: String, payload: Value) {
    tokio::spawn(async move {
        match publisher.publish(&topic, &payload).await {
            Ok(()) => tracing::debug!(topic = %topic, "Event delivered"),
            Err(e) => tracing::warn!(topic = %topic, error = %e, "Failed to publish event"),
        }
    });
}
