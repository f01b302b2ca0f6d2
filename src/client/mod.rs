//! Remote collaborators of the submission engine.
//!
//! [`TaskApi`] is the seam between chain submission and the compliance
//! service. Two implementations ship with the crate:
//!
//! - [`HttpTaskApi`](http::HttpTaskApi) talks to the REST endpoints.
//! - [`MemoryTaskApi`](memory::MemoryTaskApi) keeps everything in process,
//!   used for dry runs.

pub mod http;
pub mod memory;

use async_trait::async_trait;

pub use http::HttpTaskApi;
pub use memory::MemoryTaskApi;

use crate::error::ApiError;
use crate::task::{Attachment, CreatedDocument, CreatedTask, Page, TaskId, TaskInstance, TaskRecord};

/// Task creation, attachment upload and listing endpoints.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create one task and return the server record with its id.
    async fn create_task(&self, task: &TaskInstance) -> Result<CreatedTask, ApiError>;

    /// Upload `attachment` as a document of `document_type` owned by `task_id`.
    async fn upload_attachment(
        &self,
        attachment: &Attachment,
        document_type: &str,
        task_id: &TaskId,
    ) -> Result<CreatedDocument, ApiError>;

    /// Fetch one page (1-based) of existing tasks.
    async fn list_tasks(&self, page: u32, page_size: u32) -> Result<Page<TaskRecord>, ApiError>;
}
