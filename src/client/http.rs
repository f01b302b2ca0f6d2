//! REST client for the compliance task service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::TaskApi;
use crate::config::Config;
use crate::error::ApiError;
use crate::task::{Attachment, CreatedDocument, CreatedTask, Page, TaskId, TaskInstance, TaskRecord};

/// [`TaskApi`] over HTTP.
///
/// - `POST {base}/tasks` with a JSON task payload
/// - `POST {base}/documents` with a multipart form (`file`, `document_type`, `task_id`)
/// - `GET {base}/tasks?page=&page_size=`
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.token.clone(), config.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await.map_err(|e| self.classify(e))?;
        decode(response).await.map_err(|e| match e {
            ApiError::Http(inner) => self.classify(inner),
            other => other,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Http(error)
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn create_task(&self, task: &TaskInstance) -> Result<CreatedTask, ApiError> {
        let created: CreatedTask = self.send(self.client.post(self.url("tasks")).json(task)).await?;
        tracing::debug!(task_id = %created.id, deadline = %task.deadline, "task created");
        Ok(created)
    }

    async fn upload_attachment(
        &self,
        attachment: &Attachment,
        document_type: &str,
        task_id: &TaskId,
    ) -> Result<CreatedDocument, ApiError> {
        let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
        let form = Form::new()
            .text("document_type", document_type.to_string())
            .text("task_id", task_id.to_string())
            .part("file", part);
        let created: CreatedDocument = self
            .send(self.client.post(self.url("documents")).multipart(form))
            .await?;
        tracing::debug!(
            document_id = %created.id,
            task_id = %task_id,
            file = %attachment.file_name,
            "attachment uploaded"
        );
        Ok(created)
    }

    async fn list_tasks(&self, page: u32, page_size: u32) -> Result<Page<TaskRecord>, ApiError> {
        let request = self
            .client
            .get(self.url("tasks"))
            .query(&[("page", page), ("page_size", page_size)]);
        self.send(request).await
    }
}
