//! Secondary-output listing.

use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;
use warehouse_client::TaskQuery;
use warehouse_types::ArchiveTask;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// One archived output, flattened out of an archival task.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SecondaryOutput {
    /// `instance_id/task_id/subdir`, relative to the group's archive.
    pub path: String,
    pub task_id: Option<String>,
    #[schema(value_type = Object)]
    pub datatype: Value,
    #[schema(value_type = Object)]
    pub app: Value,
    #[schema(value_type = Object)]
    pub output: Value,
    #[schema(value_type = Object)]
    pub finish_date: Value,
}

/// List every secondary output archived for a project's group.
///
/// Anyone who knows the project id may list; the upstream query runs with
/// the service credential.
pub async fn list(state: &AppState, project_id: &str) -> Result<Vec<SecondaryOutput>> {
    let project = state
        .projects
        .find_by_id(project_id)?
        .ok_or_else(|| ServerError::NotFound(format!("project {}", project_id)))?;

    let config = state.config();
    let query = TaskQuery {
        select: Some("config instance_id".to_string()),
        find: Some(json!({
            "finish_date": { "$exists": true },
            "service": config.archive_service,
            "_group_id": project.group_id,
        })),
        limit: Some(config.list_limit),
        sort: Some("create_date".to_string()),
    };

    let tasks: Vec<ArchiveTask> = state
        .amaretti
        .list_tasks(&query, &state.service_jwt)
        .await?;
    tracing::debug!(
        project_id,
        group_id = project.group_id,
        tasks = tasks.len(),
        "Loaded archival tasks"
    );

    Ok(flatten(&tasks))
}

/// Flatten archival tasks into output records, in task then request order.
///
/// Tasks without requests and requests without a datatype are skipped.
pub fn flatten(tasks: &[ArchiveTask]) -> Vec<SecondaryOutput> {
    tasks
        .iter()
        .filter_map(ArchiveTask::requests)
        .flatten()
        .filter_map(|request| {
            let datatype = request.datatype.clone()?;
            Some(SecondaryOutput {
                path: request.secondary_path(),
                task_id: request.task_id.clone(),
                datatype,
                app: request.app.clone(),
                output: request.output.clone(),
                finish_date: request.finish_date.clone(),
            })
        })
        .collect()
}
