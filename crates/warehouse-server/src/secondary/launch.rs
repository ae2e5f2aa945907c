//! Group-analysis launch workflow.

use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use warehouse_client::NewTask;

use crate::auth::Caller;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Body of `POST /secondary/launchga`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LaunchRequest {
    /// Instance to launch the analysis in.
    pub instance_id: Option<String>,
    /// Container image name.
    pub container: Option<String>,
    /// Container image tag.
    pub tag: Option<String>,
    /// App to initialize inside the container.
    pub app: Option<String>,
    pub name: Option<String>,
    pub desc: Option<String>,
    /// Extra launcher configuration.
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServerError::BadRequest(format!("{} is not set", field))),
    }
}

/// Submit a group-analysis launcher task on behalf of `caller`.
///
/// Runs each step strictly in order and stops at the first failure:
/// validate, resolve the instance as the caller, escalate the caller's
/// token with the group-analysis group, find the owning project, submit.
/// Returns the created task as reported by the orchestration service.
pub async fn launch(state: &AppState, caller: &Caller, request: LaunchRequest) -> Result<Value> {
    let instance_id = required(&request.instance_id, "instance_id")?;
    let container = required(&request.container, "container")?;
    let tag = required(&request.tag, "tag")?;

    let mut config = match request.config {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ServerError::BadRequest(
                "config must be an object".to_string(),
            ));
        }
    };

    // The caller's own token proves they can see the instance.
    let mut instances = state
        .amaretti
        .find_instances(instance_id, &caller.token)
        .await?;
    if instances.len() != 1 {
        tracing::warn!(instance_id, matches = instances.len(), "Instance lookup not unique");
        return Err(ServerError::NotFound(format!("no such instance {}", instance_id)));
    }
    let instance = instances.remove(0);

    let gid = state.config().groupanalysis_gid;
    let jwt = state
        .auth
        .issue_jwt(caller.id(), &[gid], &state.service_jwt)
        .await?;

    let project = state
        .projects
        .find_by_group(instance.group_id)?
        .ok_or_else(|| {
            ServerError::NotFound(format!(
                "can't find project with group_id:{}",
                instance.group_id
            ))
        })?;

    config.insert("project".to_string(), serde_json::to_value(&project)?);
    config.insert(
        "container".to_string(),
        Value::String(format!("{}:{}", container, tag)),
    );
    config.insert("group".to_string(), Value::from(instance.group_id));
    if let Some(app) = request.app {
        config.insert("app".to_string(), Value::String(app));
    }

    let settings = state.config();
    let new_task = NewTask {
        name: request.name,
        desc: request.desc,
        service: settings.launcher_service.clone(),
        service_branch: settings.service_branch.clone(),
        instance_id: instance.id.clone(),
        max_runtime: settings.max_runtime.as_millis() as u64,
        config: Value::Object(config),
    };

    let task = state.amaretti.submit_task(&new_task, &jwt).await?;
    tracing::info!(
        user = caller.id(),
        instance_id = %instance.id,
        project_id = %project.id,
        "Submitted group-analysis launcher"
    );
    Ok(task)
}
