//! Orchestration service (amaretti) API.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use warehouse_types::{Instance, Task};

use crate::client::ServiceClient;
use crate::error::Result;
use crate::types::{InstanceList, NewTask, SubmittedTask, TaskList, TaskQuery};

/// Client for the task/instance orchestration service.
#[derive(Clone)]
pub struct AmarettiClient {
    client: ServiceClient,
}

impl AmarettiClient {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Underlying service client.
    pub fn service(&self) -> &ServiceClient {
        &self.client
    }

    /// `GET /task` with a filter. Tasks come back in the service's order.
    pub async fn list_tasks<T: DeserializeOwned>(
        &self,
        query: &TaskQuery,
        token: &str,
    ) -> Result<Vec<T>> {
        let params = query.to_params();
        let list: TaskList<T> = self.client.get("task", &params, Some(token)).await?;
        Ok(list.tasks)
    }

    /// `GET /task/:id`
    pub async fn get_task(&self, task_id: &str, token: &str) -> Result<Task> {
        let none: &[(&str, &str)] = &[];
        self.client
            .get(&format!("task/{}", task_id), none, Some(token))
            .await
    }

    /// `GET /instance?find={"_id": id}`; every match is returned.
    pub async fn find_instances(&self, instance_id: &str, token: &str) -> Result<Vec<Instance>> {
        let find = json!({ "_id": instance_id }).to_string();
        let list: InstanceList = self
            .client
            .get("instance", &[("find", find)], Some(token))
            .await?;
        Ok(list.instances)
    }

    /// `POST /task`; returns the created task as the service reports it.
    pub async fn submit_task(&self, task: &NewTask, token: &str) -> Result<Value> {
        let submitted: SubmittedTask = self.client.post("task", task, Some(token)).await?;
        Ok(submitted.task)
    }
}
