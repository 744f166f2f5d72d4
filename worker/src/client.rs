use common::{
    CompleteMapTaskRequest, CompleteReduceTaskRequest, CompleteTaskResponse, JobStatusResponse,
    LeaseMapTaskResponse, LeaseReduceTaskResponse, TaskId, MAP_COMPLETE_PATH, MAP_LEASE_PATH,
    REDUCE_COMPLETE_PATH, REDUCE_LEASE_PATH, STATUS_PATH,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

/// Cliente HTTP de las RPC del coordinador.
/// Cualquier error de acá es de transporte: el coordinador no responde.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> reqwest::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .post(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> reqwest::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn lease_map_task(&self) -> reqwest::Result<LeaseMapTaskResponse> {
        self.post_empty(MAP_LEASE_PATH).await
    }

    pub async fn complete_map_task(&self, map_task_id: TaskId) -> reqwest::Result<()> {
        let _: CompleteTaskResponse = self
            .post_json(MAP_COMPLETE_PATH, &CompleteMapTaskRequest { map_task_id })
            .await?;
        Ok(())
    }

    pub async fn lease_reduce_task(&self) -> reqwest::Result<LeaseReduceTaskResponse> {
        self.post_empty(REDUCE_LEASE_PATH).await
    }

    pub async fn complete_reduce_task(&self, reduce_task_id: TaskId) -> reqwest::Result<()> {
        let _: CompleteTaskResponse = self
            .post_json(REDUCE_COMPLETE_PATH, &CompleteReduceTaskRequest { reduce_task_id })
            .await?;
        Ok(())
    }

    pub async fn job_status(&self) -> reqwest::Result<JobStatusResponse> {
        let url = format!("{}{}", self.base_url, STATUS_PATH);
        self.http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
