//! Chained submission of recurring tasks.
//!
//! [`TaskSubmitter::submit`] expands a template, creates the occurrences one
//! at a time so each can point at the id of the one before it, then uploads
//! the founding attachments to the head task only.
//!
//! There is no rollback: when a creation fails, tasks created before it stay
//! on the server and their ids are reported in the error.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::cache::ListCache;
use crate::chain::DependencyChain;
use crate::client::TaskApi;
use crate::error::{ApiError, AttachmentFailure, SubmitError};
use crate::expand::{expand, ExpandOptions};
use crate::task::{Attachment, TaskId, TaskInstance, TaskRecord, TaskTemplate};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fully successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Created task ids in chain order.
    pub task_ids: Vec<TaskId>,
    /// Documents created for the head task, in attachment order.
    pub document_ids: Vec<TaskId>,
}

impl SubmitOutcome {
    pub fn head(&self) -> Option<&TaskId> {
        self.task_ids.first()
    }
}

pub struct TaskSubmitter<'a> {
    api: &'a dyn TaskApi,
    options: ExpandOptions,
    timeout: Duration,
    cancel: CancellationToken,
    task_cache: Option<&'a ListCache<TaskRecord>>,
}

impl<'a> TaskSubmitter<'a> {
    pub fn new(api: &'a dyn TaskApi) -> Self {
        Self {
            api,
            options: ExpandOptions::default(),
            timeout: DEFAULT_TIMEOUT,
            cancel: CancellationToken::new(),
            task_cache: None,
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    /// Upper bound for each individual remote call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop the chain before the next creation once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Invalidate `cache` whenever this submitter creates tasks.
    pub fn with_task_cache(mut self, cache: &'a ListCache<TaskRecord>) -> Self {
        self.task_cache = Some(cache);
        self
    }

    /// Create every occurrence of `template`, then attach `attachments` to
    /// the first created task.
    pub async fn submit(
        &self,
        template: &TaskTemplate,
        attachments: &[Attachment],
        document_type: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        let instances = expand(template, &self.options)?;

        let created = self.create_chain(template, instances).await;
        let any_created = match &created {
            Ok(ids) => !ids.is_empty(),
            Err(e) => !e.created_ids().is_empty(),
        };
        if any_created {
            if let Some(cache) = self.task_cache {
                cache.invalidate().await;
            }
        }
        let task_ids = created?;

        let document_ids = self.upload_attachments(&task_ids, attachments, document_type).await?;
        Ok(SubmitOutcome {
            task_ids,
            document_ids,
        })
    }

    async fn create_chain(
        &self,
        template: &TaskTemplate,
        instances: Vec<TaskInstance>,
    ) -> Result<Vec<TaskId>, SubmitError> {
        let total = instances.len();
        let mut chain = DependencyChain::new(template.dependent_task_id.clone());

        for instance in instances {
            if self.cancel.is_cancelled() {
                tracing::warn!(created = chain.linked().len(), total, "submission cancelled");
                return Err(SubmitError::Cancelled {
                    created: chain.into_linked(),
                });
            }

            let occurrence = instance.occurrence;
            let linked = chain.link(instance)?;
            match self.call(self.api.create_task(&linked)).await {
                Ok(task) => {
                    tracing::info!(
                        occurrence,
                        task_id = %task.id,
                        deadline = %linked.deadline,
                        depends_on = ?linked.dependent_task_id.as_ref().map(TaskId::as_str),
                        "created task"
                    );
                    chain.record(task.id)?;
                }
                Err(source) => {
                    tracing::warn!(
                        occurrence,
                        total,
                        error = %source,
                        "task creation failed, chain halted"
                    );
                    return Err(SubmitError::RemoteCreation {
                        occurrence,
                        created: chain.into_linked(),
                        source,
                    });
                }
            }
        }
        Ok(chain.into_linked())
    }

    async fn upload_attachments(
        &self,
        task_ids: &[TaskId],
        attachments: &[Attachment],
        document_type: &str,
    ) -> Result<Vec<TaskId>, SubmitError> {
        let Some(head) = task_ids.first() else {
            return Ok(Vec::new());
        };
        if attachments.is_empty() {
            return Ok(Vec::new());
        }
        if self.cancel.is_cancelled() {
            return Err(SubmitError::Cancelled {
                created: task_ids.to_vec(),
            });
        }

        let uploads = attachments.iter().map(|attachment| async move {
            let result = self
                .call(self.api.upload_attachment(attachment, document_type, head))
                .await;
            (attachment.file_name.clone(), result)
        });

        let mut document_ids = Vec::new();
        let mut failures = Vec::new();
        for (name, result) in join_all(uploads).await {
            match result {
                Ok(document) => document_ids.push(document.id),
                Err(error) => {
                    tracing::warn!(
                        task_id = %head,
                        file = %name,
                        error = %error,
                        "attachment upload failed"
                    );
                    failures.push(AttachmentFailure { name, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(document_ids)
        } else {
            Err(SubmitError::AttachmentUpload {
                task_ids: task_ids.to_vec(),
                document_ids,
                failures,
            })
        }
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))?
    }
}
