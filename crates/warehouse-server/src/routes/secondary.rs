//! Secondary-output endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Caller;
use crate::error::ServerError;
use crate::secondary::{self, LaunchRequest, SecondaryOutput};
use crate::state::AppState;

/// List the secondary outputs of a project (no auth required).
#[utoipa::path(
    get,
    path = "/secondary/list/{projectid}",
    params(
        ("projectid" = String, Path, description = "Project ID"),
    ),
    responses(
        (status = 200, description = "Flattened secondary outputs", body = Vec<SecondaryOutput>),
        (status = 404, description = "Project not found"),
        (status = 502, description = "Orchestration service failed"),
    ),
    tag = "secondary"
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<SecondaryOutput>>, ServerError> {
    let outputs = secondary::list(&state, &project_id).await?;
    Ok(Json(outputs))
}

/// Path parameters of a download.
#[derive(Debug, Deserialize)]
pub struct DownloadPath {
    pub task_id: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Query parameters of a download (`at` is consumed by the auth middleware).
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub p: Option<String>,
}

/// Download a file, or list a directory, under a task's secondary output.
#[utoipa::path(
    get,
    path = "/secondary/{task_id}/{path}",
    params(
        ("task_id" = String, Path, description = "Task whose secondary output is read"),
        ("path" = String, Path, description = "Path relative to the secondary output"),
        ("p" = Option<String>, Query, description = "Relative path; wins over the URL path"),
        ("at" = Option<String>, Query, description = "Access token"),
    ),
    responses(
        (status = 200, description = "File bytes, or a JSON listing for directories", body = Vec<crate::storage::DirEntry>),
        (status = 400, description = "Path escapes the secondary output"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller neither owns the task nor belongs to its group"),
        (status = 404, description = "Task or target not found"),
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "secondary"
)]
pub async fn download_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(params): Path<DownloadPath>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let relative = query.p.or(params.path).unwrap_or_default();

    let download =
        secondary::prepare_download(&state, &params.task_id, &relative, &caller, &headers).await?;
    Ok(download.into_response(state.publisher.clone()))
}

/// Launch a group-analysis container.
#[utoipa::path(
    post,
    path = "/secondary/launchga",
    request_body = LaunchRequest,
    responses(
        (status = 200, description = "Submitted launcher task", body = Object),
        (status = 400, description = "Missing instance_id, container or tag"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Instance or project not found"),
        (status = 502, description = "Upstream service failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "secondary"
)]
pub async fn launch_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<LaunchRequest>,
) -> Result<Json<Value>, ServerError> {
    let task = secondary::launch(&state, &caller, request).await?;
    Ok(Json(task))
}
