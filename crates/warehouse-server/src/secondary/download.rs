//! Secondary-content download.

use std::io;
use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use warehouse_types::{DownloadEvent, SharedEventPublisher, Task};

use crate::auth::Caller;
use crate::error::{Result, ServerError};
use crate::events::spawn_publish;
use crate::secondary::path::resolve_within;
use crate::state::AppState;
use crate::storage::SecondaryContent;

/// Header values that never reach the audit event.
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie"];

/// An authorized, opened download that has not been sent yet.
#[derive(Debug)]
pub struct Download {
    /// Lexically resolved target.
    pub path: String,
    pub content: SecondaryContent,
    /// Published once the body has been handed to the transport.
    pub event: DownloadEvent,
}

/// Authorize `caller` for `task_id`, resolve `relative` under the task's
/// secondary directory and open it.
///
/// The traversal guard runs before storage is touched.
pub async fn prepare_download(
    state: &AppState,
    task_id: &str,
    relative: &str,
    caller: &Caller,
    headers: &HeaderMap,
) -> Result<Download> {
    let task = state.amaretti.get_task(task_id, &state.service_jwt).await?;
    authorize(&task, caller)?;

    let prefix = secondary_prefix(&state.config().archive_root(), &task)?;
    let path = resolve_within(&prefix, relative)?;
    tracing::debug!(task_id, %prefix, %path, "Resolved secondary path");

    let content = state.storage.open(Path::new(&path)).await?;

    let event = DownloadEvent {
        user_id: caller.id().to_string(),
        group_id: task.group_id.unwrap_or_default(),
        task_id: task.id.clone().unwrap_or_else(|| task_id.to_string()),
        headers: headers_to_json(headers),
        path: path.clone(),
    };

    Ok(Download {
        path,
        content,
        event,
    })
}

/// The task's owner or any member of its group may download.
fn authorize(task: &Task, caller: &Caller) -> Result<()> {
    let member = task.group_id.is_some_and(|gid| caller.claims.is_member(gid));
    if task.is_owned_by(caller.id()) || member {
        return Ok(());
    }
    Err(ServerError::Forbidden(format!(
        "you don't own task {} nor belong to group {}",
        task.id.as_deref().unwrap_or("?"),
        task.group_id.map(|g| g.to_string()).unwrap_or_default(),
    )))
}

/// `<root>/<group>/<instance>/<followed task>`
fn secondary_prefix(root: &str, task: &Task) -> Result<String> {
    let group_id = task
        .group_id
        .ok_or_else(|| ServerError::Upstream("task has no _group_id".to_string()))?;
    let instance_id = task
        .instance_id
        .as_deref()
        .ok_or_else(|| ServerError::Upstream("task has no instance_id".to_string()))?;
    let followed = task.followed_task_id().ok_or_else(|| {
        ServerError::NotFound(format!(
            "task {} does not follow another task",
            task.id.as_deref().unwrap_or("?")
        ))
    })?;

    Ok(format!("{}/{}/{}/{}", root, group_id, instance_id, followed))
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let value = if REDACTED_HEADERS.contains(&name.as_str()) {
            "[redacted]".to_string()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };
        map.insert(name.as_str().to_string(), Value::String(value));
    }
    Value::Object(map)
}

impl Download {
    /// Build the streaming response. The event fires only if every byte is
    /// read and handed over; a disconnect or a read error suppresses it.
    pub fn into_response(self, publisher: SharedEventPublisher) -> Response {
        let Download { path, content, event } = self;

        let (len, content_type, stream): (u64, HeaderValue, BoxStream<'static, io::Result<Bytes>>) =
            match content {
                SecondaryContent::File { len, stream } => (
                    len,
                    HeaderValue::from_static("application/octet-stream"),
                    stream,
                ),
                SecondaryContent::Directory(entries) => match serde_json::to_vec(&entries) {
                    Ok(listing) => (
                        listing.len() as u64,
                        HeaderValue::from_static("application/json"),
                        futures::stream::once(async move { Ok(Bytes::from(listing)) }).boxed(),
                    ),
                    Err(e) => return ServerError::from(e).into_response(),
                },
            };

        let on_complete = move || {
            tracing::info!(path = %event.path, user = %event.user_id, "Secondary download completed");
            spawn_publish(publisher, event.topic(), event.payload());
        };

        let body = if len == 0 {
            on_complete();
            Body::empty()
        } else {
            Body::from_stream(with_completion(stream, len, path, on_complete))
        };

        (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_LENGTH, HeaderValue::from(len)),
            ],
            body,
        )
            .into_response()
    }
}

/// Pass `inner` through, calling `on_complete` once `len` bytes have been
/// read without error.
fn with_completion<F>(
    mut inner: BoxStream<'static, io::Result<Bytes>>,
    len: u64,
    path: String,
    on_complete: F,
) -> impl futures::Stream<Item = io::Result<Bytes>> + Send + 'static
where
    F: FnOnce() + Send + 'static,
{
    async_stream::stream! {
        let mut on_complete = Some(on_complete);
        let mut sent: u64 = 0;

        while let Some(chunk) = inner.next().await {
            match chunk {
                Ok(bytes) => {
                    sent += bytes.len() as u64;
                    if sent >= len {
                        if let Some(done) = on_complete.take() {
                            done();
                        }
                    }
                    yield Ok(bytes);
                }
                Err(e) => {
                    tracing::error!(%path, error = %e, sent, "Secondary stream failed");
                    on_complete = None;
                    yield Err(e);
                    break;
                }
            }
        }

        if sent < len {
            tracing::warn!(%path, sent, len, "Secondary stream ended early");
        } else if let Some(done) = on_complete.take() {
            done();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tests::RecordingPublisher;
    use axum::http::HeaderName;
    use warehouse_types::Claims;

    fn caller(sub: &str, gids: Vec<i64>) -> Caller {
        Caller {
            claims: Claims {
                sub: sub.to_string(),
                gids,
                exp: None,
            },
            token: "t".to_string(),
        }
    }

    fn task(json: Value) -> Task {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_owner_and_member_are_authorized() {
        let t = task(serde_json::json!({"_id": "t", "_group_id": 5, "user_id": "1"}));
        assert!(authorize(&t, &caller("1", vec![])).is_ok());
        assert!(authorize(&t, &caller("2", vec![5])).is_ok());

        let err = authorize(&t, &caller("2", vec![6])).unwrap_err();
        assert!(matches!(err, ServerError::Forbidden(_)));
    }

    #[test]
    fn test_numeric_owner_matches_string_sub() {
        let t = task(serde_json::json!({"_id": "t", "_group_id": 5, "user_id": 17}));
        assert!(authorize(&t, &caller("17", vec![])).is_ok());
    }

    #[test]
    fn test_prefix() {
        let t = task(serde_json::json!({
            "_id": "t", "_group_id": 5, "instance_id": "i",
            "deps_config": [{"task": "f"}, {"task": "g"}],
        }));
        assert_eq!(secondary_prefix("/data", &t).unwrap(), "/data/5/i/f");
    }

    #[test]
    fn test_prefix_without_dependency() {
        let t = task(serde_json::json!({"_id": "t", "_group_id": 5, "instance_id": "i"}));
        assert!(matches!(
            secondary_prefix("/data", &t),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn test_headers_are_redacted_and_joined() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.append(HeaderName::from_static("x-tag"), HeaderValue::from_static("a"));
        headers.append(HeaderName::from_static("x-tag"), HeaderValue::from_static("b"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8"));

        let json = headers_to_json(&headers);
        assert_eq!(json["authorization"], "[redacted]");
        assert_eq!(json["x-tag"], "a, b");
        assert_eq!(json["user-agent"], "curl/8");
    }

    fn chunks(parts: Vec<io::Result<&'static [u8]>>) -> BoxStream<'static, io::Result<Bytes>> {
        futures::stream::iter(parts.into_iter().map(|p| p.map(Bytes::from_static))).boxed()
    }

    #[tokio::test]
    async fn test_completion_fires_after_all_bytes() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let stream = with_completion(
            chunks(vec![Ok(b"ab"), Ok(b"cd")]),
            4,
            "/x".to_string(),
            move || {
                let _ = tx.send(());
            },
        );
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_completion_suppressed_on_error() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let stream = with_completion(
            chunks(vec![Ok(b"ab"), Err(io::Error::other("disk")), Ok(b"cd")]),
            4,
            "/x".to_string(),
            move || {
                let _ = tx.send(());
            },
        );
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_completion_suppressed_when_dropped_early() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let stream = with_completion(
            chunks(vec![Ok(b"ab"), Ok(b"cd")]),
            4,
            "/x".to_string(),
            move || {
                let _ = tx.send(());
            },
        );
        let mut stream = Box::pin(stream);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"ab");
        drop(stream);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_directory_response_publishes() {
        let (publisher, mut rx) = RecordingPublisher::channel();
        let download = Download {
            path: "/data/1/i/t".to_string(),
            content: SecondaryContent::Directory(vec![]),
            event: DownloadEvent {
                user_id: "u".to_string(),
                group_id: 1,
                task_id: "t".to_string(),
                headers: serde_json::json!({}),
                path: "/data/1/i/t".to_string(),
            },
        };

        let response = download.into_response(publisher);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"[]");

        let (topic, payload) = rx.recv().await.unwrap();
        assert_eq!(topic, "secondary.download.u.1.t");
        assert_eq!(payload["path"], "/data/1/i/t");
    }
}
