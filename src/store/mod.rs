mod client;
mod error;
mod resource;

pub use error::StoreError;
pub use resource::*;

use client::Client;
use log::*;
use reqwest::Method;
use serde::Deserialize;
use std::time::Duration;

/// Default timeout applied to every store request.
///
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Responsible for asynchronous interaction with the task store API
/// including transformation of response data into explicitly-defined types.
/// Never touches local state.
///
#[derive(Clone)]
pub struct TaskStore {
    client: Option<Client>,
}

impl TaskStore {
    /// Returns a new instance for the given endpoint and token. An empty
    /// endpoint or token yields an unconfigured store whose every call fails
    /// with `StoreError::Unconfigured`.
    ///
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<TaskStore, StoreError> {
        if endpoint.trim().is_empty() || token.trim().is_empty() {
            debug!("Task store endpoint or token missing, store is unconfigured");
            return Ok(TaskStore::unconfigured());
        }
        debug!("Initializing task store client for {}...", endpoint);
        Ok(TaskStore {
            client: Some(Client::new(token, endpoint, timeout)?),
        })
    }

    /// Returns a store that refuses every call.
    ///
    pub fn unconfigured() -> TaskStore {
        TaskStore { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Client, StoreError> {
        self.client.as_ref().ok_or(StoreError::Unconfigured)
    }

    /// Returns every pending task.
    ///
    pub async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        debug!("Requesting pending tasks...");

        #[derive(Deserialize)]
        struct TaskList {
            tasks: Vec<Task>,
        }

        let data: TaskList = self.client()?.get("/api/tasks").await?;
        debug!("Retrieved {} pending tasks", data.tasks.len());
        Ok(data.tasks)
    }

    /// Creates a task and returns the store's durable version of it.
    ///
    pub async fn create_task(&self, text: &str, area: &Area) -> Result<Task, StoreError> {
        debug!("Creating task in area '{}'...", area);
        let body = serde_json::json!({ "text": text, "area": area });
        let task: Task = self.client()?.post("/api/tasks", body).await?;
        if task.is_provisional() {
            return Err(StoreError::transport("store returned a provisional id"));
        }
        debug!("Store created task {}", task.id);
        Ok(task)
    }

    /// Marks a task completed. Completing an id the store no longer knows
    /// is not an error.
    ///
    pub async fn complete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        debug!("Completing task {}...", id);
        let path = format!("/api/tasks/{}/complete", Self::durable(id)?);
        self.client()?.send_idempotent(Method::POST, &path).await
    }

    /// Deletes a task. Deleting an id the store no longer knows is not an
    /// error.
    ///
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        debug!("Deleting task {}...", id);
        let path = format!("/api/tasks/{}", Self::durable(id)?);
        self.client()?.send_idempotent(Method::DELETE, &path).await
    }

    /// Returns the store's summary counters.
    ///
    pub async fn get_stats(&self) -> Result<Stats, StoreError> {
        debug!("Requesting task stats...");
        self.client()?.get("/api/stats").await
    }

    /// Returns today's reading suggestion.
    ///
    pub async fn get_article(&self) -> Result<Article, StoreError> {
        debug!("Requesting daily article...");
        self.client()?.get("/api/article").await
    }

    /// Probe a candidate endpoint without consulting stored configuration.
    ///
    pub async fn probe_health(endpoint: &str, token: &str) -> Result<HealthStatus, StoreError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let token = token.trim();
        if endpoint.is_empty() || token.is_empty() {
            return Err(StoreError::Unconfigured);
        }
        info!("Testing connection to {}...", endpoint);
        let client = Client::new(token, endpoint, DEFAULT_TIMEOUT)?;
        let status = match client.get_status("/api/health").await {
            Ok(()) => HealthStatus::Healthy,
            Err(StoreError::Unauthorized) => HealthStatus::InvalidToken,
            Err(StoreError::Unavailable {
                status: Some(status),
                ..
            }) => HealthStatus::Failed(status),
            Err(StoreError::Unavailable { status: None, .. }) => HealthStatus::Unreachable,
            Err(StoreError::Unconfigured) => return Err(StoreError::Unconfigured),
        };
        info!("Connection test result: {}", status);
        Ok(status)
    }

    /// Return whether the endpoint answers the health check with a success.
    ///
    pub async fn check_health(endpoint: &str, token: &str) -> bool {
        matches!(
            TaskStore::probe_health(endpoint, token).await,
            Ok(HealthStatus::Healthy)
        )
    }

    fn durable(id: &TaskId) -> Result<&str, StoreError> {
        id.as_durable().ok_or_else(|| {
            StoreError::transport(format!("{} has not been confirmed by the store", id))
        })
    }
}
