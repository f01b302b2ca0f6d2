//! In-process task service.
//!
//! Assigns sequential ids and keeps every created task and document so
//! callers can inspect what a submission would have sent.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Map;

use super::TaskApi;
use crate::error::ApiError;
use crate::task::{Attachment, CreatedDocument, CreatedTask, Page, TaskId, TaskInstance, TaskRecord};

/// Document stored by [`MemoryTaskApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: TaskId,
    pub task_id: TaskId,
    pub document_type: String,
    pub file_name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    tasks: Vec<(TaskId, TaskInstance)>,
    documents: Vec<StoredDocument>,
}

#[derive(Debug)]
pub struct MemoryTaskApi {
    inner: Mutex<Inner>,
    fail_at: Option<usize>,
}

impl Default for MemoryTaskApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskApi {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start assigning ids from `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: first_id,
                ..Inner::default()
            }),
            fail_at: None,
        }
    }

    /// Reject every task creation once `n` tasks exist.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Created tasks with their ids, in creation order.
    pub fn tasks(&self) -> Vec<(TaskId, TaskInstance)> {
        self.lock().tasks.clone()
    }

    pub fn documents(&self) -> Vec<StoredDocument> {
        self.lock().documents.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn allocate(inner: &mut Inner) -> TaskId {
        let id = TaskId::from(inner.next_id);
        inner.next_id += 1;
        id
    }
}

#[async_trait]
impl TaskApi for MemoryTaskApi {
    async fn create_task(&self, task: &TaskInstance) -> Result<CreatedTask, ApiError> {
        let mut inner = self.lock();
        if self.fail_at == Some(inner.tasks.len()) {
            return Err(ApiError::Rejected(format!(
                "task creation refused at request {}",
                inner.tasks.len()
            )));
        }
        let id = Self::allocate(&mut inner);
        inner.tasks.push((id.clone(), task.clone()));
        Ok(CreatedTask {
            id,
            fields: Map::new(),
        })
    }

    async fn upload_attachment(
        &self,
        attachment: &Attachment,
        document_type: &str,
        task_id: &TaskId,
    ) -> Result<CreatedDocument, ApiError> {
        let mut inner = self.lock();
        if !inner.tasks.iter().any(|(id, _)| id == task_id) {
            return Err(ApiError::Rejected(format!("unknown task {task_id}")));
        }
        let id = Self::allocate(&mut inner);
        inner.documents.push(StoredDocument {
            id: id.clone(),
            task_id: task_id.clone(),
            document_type: document_type.to_string(),
            file_name: attachment.file_name.clone(),
            size: attachment.bytes.len(),
        });
        Ok(CreatedDocument {
            id,
            fields: Map::new(),
        })
    }

    async fn list_tasks(&self, page: u32, page_size: u32) -> Result<Page<TaskRecord>, ApiError> {
        let inner = self.lock();
        let size = page_size.max(1) as usize;
        let start = (page.max(1) as usize - 1) * size;
        let items = inner
            .tasks
            .iter()
            .skip(start)
            .take(size)
            .map(|(id, task)| TaskRecord {
                id: id.clone(),
                description: Some(task.description.clone()),
                deadline: Some(task.deadline),
                category: task.category.clone(),
                dependent_task_id: task.dependent_task_id.clone(),
            })
            .collect();
        Ok(Page {
            items,
            total: Some(inner.tasks.len() as u64),
        })
    }
}
