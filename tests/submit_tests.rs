//! Chained submission against a recording task service.
//!
//! The fake service records every call in order and hands out ids of the
//! form `srv-<n>`, so tests can check links, ordering and attachment routing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::Map;
use tokio_util::sync::CancellationToken;

use compliance_tasks::cache::{fetch_all_tasks, ListCache};
use compliance_tasks::client::{MemoryTaskApi, TaskApi};
use compliance_tasks::fields::{DescriptionSuffix, Recurrence, Span};
use compliance_tasks::task::{CreatedDocument, CreatedTask, Page, TaskRecord};
use compliance_tasks::{
    ApiError, Attachment, ExpandOptions, SubmitError, TaskId, TaskInstance, TaskSubmitter,
    TaskTemplate, ValidationError,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(TaskInstance),
    Upload { file: String, task_id: TaskId },
}

#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_create_at: Option<usize>,
    fail_upload: Option<String>,
    create_delay: Option<Duration>,
    upload_delay: Option<Duration>,
    uploads_in_flight: AtomicUsize,
    peak_uploads_in_flight: AtomicUsize,
    cancel_during: Option<(usize, CancellationToken)>,
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn created(&self) -> Vec<TaskInstance> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(task) => Some(task),
                Call::Upload { .. } => None,
            })
            .collect()
    }

    fn uploads(&self) -> Vec<(String, TaskId)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { file, task_id } => Some((file, task_id)),
                Call::Create(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl TaskApi for RecordingApi {
    async fn create_task(&self, task: &TaskInstance) -> Result<CreatedTask, ApiError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Create(task.clone()));
            calls.iter().filter(|c| matches!(c, Call::Create(_))).count() - 1
        };
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((at, token)) = &self.cancel_during {
            if *at == index {
                token.cancel();
            }
        }
        if self.fail_create_at == Some(index) {
            return Err(ApiError::Status {
                status: 500,
                body: "internal error".into(),
            });
        }
        Ok(CreatedTask {
            id: TaskId::from(format!("srv-{index}")),
            fields: Map::new(),
        })
    }

    async fn upload_attachment(
        &self,
        attachment: &Attachment,
        _document_type: &str,
        task_id: &TaskId,
    ) -> Result<CreatedDocument, ApiError> {
        self.calls.lock().unwrap().push(Call::Upload {
            file: attachment.file_name.clone(),
            task_id: task_id.clone(),
        });
        if let Some(delay) = self.upload_delay {
            let now = self.uploads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_uploads_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.uploads_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if self.fail_upload.as_deref() == Some(attachment.file_name.as_str()) {
            return Err(ApiError::Status {
                status: 413,
                body: "too large".into(),
            });
        }
        Ok(CreatedDocument {
            id: TaskId::from(format!("doc-{}", attachment.file_name)),
            fields: Map::new(),
        })
    }

    async fn list_tasks(&self, _page: u32, _page_size: u32) -> Result<Page<TaskRecord>, ApiError> {
        Ok(Page {
            items: Vec::new(),
            total: Some(0),
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn gst_template() -> TaskTemplate {
    TaskTemplate::new("File GST return", date(2025, 1, 15)).with_recurrence(Recurrence::Quarterly)
}

fn attachments(names: &[&str]) -> Vec<Attachment> {
    names.iter().map(|n| Attachment::new(*n, n.as_bytes().to_vec())).collect()
}

mod chain_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_non_recurring_creates_single_unlinked_task() {
        let api = RecordingApi::default();
        let template = TaskTemplate::new("Annual AML review", date(2025, 9, 30));

        let outcome = TaskSubmitter::new(&api)
            .submit(&template, &[], "Task Attachment")
            .await
            .unwrap();

        assert_eq!(outcome.task_ids, vec![TaskId::from("srv-0")]);
        let created = api.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].deadline, date(2025, 9, 30));
        assert_eq!(created[0].dependent_task_id, None);
    }

    #[tokio::test]
    async fn test_quarterly_chain_links_previous_ids() {
        let api = RecordingApi::default();
        let outcome = TaskSubmitter::new(&api)
            .submit(&gst_template(), &[], "Task Attachment")
            .await
            .unwrap();

        assert_eq!(
            outcome.task_ids,
            vec![
                TaskId::from("srv-0"),
                TaskId::from("srv-1"),
                TaskId::from("srv-2"),
                TaskId::from("srv-3")
            ]
        );

        let created = api.created();
        let deadlines: Vec<_> = created.iter().map(|t| t.deadline).collect();
        assert_eq!(
            deadlines,
            vec![date(2025, 1, 15), date(2025, 4, 15), date(2025, 7, 15), date(2025, 10, 15)]
        );
        let links: Vec<_> = created.iter().map(|t| t.dependent_task_id.clone()).collect();
        assert_eq!(
            links,
            vec![
                None,
                Some(TaskId::from("srv-0")),
                Some(TaskId::from("srv-1")),
                Some(TaskId::from("srv-2"))
            ]
        );
    }

    #[tokio::test]
    async fn test_submission_order_matches_chain_order() {
        let api = RecordingApi::default();
        let template = TaskTemplate::new("NAV report", date(2025, 1, 31))
            .with_recurrence(Recurrence::Monthly);
        let options = ExpandOptions::years(3).with_suffix(DescriptionSuffix::Occurrence);

        TaskSubmitter::new(&api)
            .with_options(options)
            .submit(&template, &[], "Task Attachment")
            .await
            .unwrap();

        let created = api.created();
        assert_eq!(created.len(), 36);
        for (i, task) in created.iter().enumerate() {
            assert_eq!(task.occurrence as usize, i);
            assert_eq!(task.description, format!("NAV report #Monthly {}", i + 1));
        }
        assert_eq!(created[1].deadline, date(2025, 2, 28));
        assert_eq!(created[13].deadline, date(2026, 2, 28));
    }

    #[tokio::test]
    async fn test_external_predecessor_heads_the_chain() {
        let api = RecordingApi::default();
        let template = gst_template().with_predecessor(TaskId::from("existing-7"));

        TaskSubmitter::new(&api)
            .submit(&template, &[], "Task Attachment")
            .await
            .unwrap();

        let created = api.created();
        assert_eq!(created[0].dependent_task_id, Some(TaskId::from("existing-7")));
        assert_eq!(created[1].dependent_task_id, Some(TaskId::from("srv-0")));
    }
}

mod attachment_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_attachments_go_to_head_task_only() {
        let api = RecordingApi::default();
        let files = attachments(&["gst-workpapers.xlsx", "bas-summary.pdf"]);

        let outcome = TaskSubmitter::new(&api)
            .submit(&gst_template(), &files, "Task Attachment")
            .await
            .unwrap();

        assert_eq!(outcome.task_ids.len(), 4);
        assert_eq!(outcome.document_ids.len(), 2);
        let uploads = api.uploads();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|(_, task)| task == &TaskId::from("srv-0")));

        // Every creation precedes every upload.
        let calls = api.calls();
        let first_upload = calls.iter().position(|c| matches!(c, Call::Upload { .. })).unwrap();
        assert_eq!(first_upload, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_run_concurrently_and_all_finish() {
        let api = RecordingApi {
            upload_delay: Some(Duration::from_secs(5)),
            ..RecordingApi::default()
        };
        let files = attachments(&["gst-workpapers.xlsx", "bas-summary.pdf", "ledger.csv"]);

        let started = tokio::time::Instant::now();
        let outcome = TaskSubmitter::new(&api)
            .with_timeout(Duration::from_secs(10))
            .submit(&gst_template(), &files, "Task Attachment")
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.document_ids.len(), 3);
        assert_eq!(api.peak_uploads_in_flight.load(Ordering::SeqCst), 3);
        assert_eq!(api.uploads_in_flight.load(Ordering::SeqCst), 0);
        assert!(elapsed >= Duration::from_secs(5), "finished before uploads: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "uploads ran one by one: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_failed_upload_reported_without_rollback() {
        let api = RecordingApi {
            fail_upload: Some("huge.zip".into()),
            ..RecordingApi::default()
        };
        let files = attachments(&["deed.pdf", "huge.zip"]);

        let err = TaskSubmitter::new(&api)
            .submit(&gst_template(), &files, "Task Attachment")
            .await
            .unwrap_err();

        match err {
            SubmitError::AttachmentUpload {
                task_ids,
                document_ids,
                failures,
            } => {
                assert_eq!(task_ids.len(), 4);
                assert_eq!(document_ids, vec![TaskId::from("doc-deed.pdf")]);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].name, "huge.zip");
                assert!(matches!(failures[0].error, ApiError::Status { status: 413, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod failure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_failure_mid_chain_halts_and_reports_created() {
        let api = RecordingApi {
            fail_create_at: Some(2),
            ..RecordingApi::default()
        };
        let template = TaskTemplate::new("NAV report", date(2025, 1, 10))
            .with_recurrence(Recurrence::Monthly);
        let files = attachments(&["nav.xlsx"]);

        let err = TaskSubmitter::new(&api)
            .submit(&template, &files, "Task Attachment")
            .await
            .unwrap_err();

        match &err {
            SubmitError::RemoteCreation {
                occurrence,
                created,
                source,
            } => {
                assert_eq!(*occurrence, 2);
                assert_eq!(created, &vec![TaskId::from("srv-0"), TaskId::from("srv-1")]);
                assert!(matches!(source, ApiError::Status { status: 500, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.created_ids().len(), 2);
        // Instances 3..=11 are never attempted and nothing is uploaded.
        assert_eq!(api.created().len(), 3);
        assert!(api.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recurrence_makes_no_calls() {
        let api = RecordingApi::default();
        let err = "Fortnightly".parse::<Recurrence>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownRecurrence("Fortnightly".into()));

        let template = TaskTemplate::new("  ", date(2025, 1, 1))
            .with_recurrence(Recurrence::Weekly);
        let err = TaskSubmitter::new(&api)
            .submit(&template, &[], "Task Attachment")
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::EmptyDescription)));

        let template = gst_template();
        let err = TaskSubmitter::new(&api)
            .with_options(ExpandOptions {
                span: Span::Occurrences(0),
                ..ExpandOptions::default()
            })
            .submit(&template, &[], "Task Attachment")
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::EmptySpan)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_creation_times_out() {
        let api = RecordingApi {
            create_delay: Some(Duration::from_secs(60)),
            ..RecordingApi::default()
        };

        let err = TaskSubmitter::new(&api)
            .with_timeout(Duration::from_secs(10))
            .submit(&gst_template(), &[], "Task Attachment")
            .await
            .unwrap_err();

        match err {
            SubmitError::RemoteCreation {
                occurrence,
                created,
                source: ApiError::Timeout(after),
            } => {
                assert_eq!(occurrence, 0);
                assert!(created.is_empty());
                assert_eq!(after, Duration::from_secs(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.created().len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_after_in_flight_request() {
        let token = CancellationToken::new();
        let api = RecordingApi {
            cancel_during: Some((1, token.clone())),
            ..RecordingApi::default()
        };
        let files = attachments(&["deed.pdf"]);

        let err = TaskSubmitter::new(&api)
            .with_cancellation(token)
            .submit(&gst_template(), &files, "Task Attachment")
            .await
            .unwrap_err();

        match err {
            SubmitError::Cancelled { created } => {
                assert_eq!(created, vec![TaskId::from("srv-0"), TaskId::from("srv-1")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.created().len(), 2);
        assert!(api.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_creates_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let api = RecordingApi::default();

        let err = TaskSubmitter::new(&api)
            .with_cancellation(token)
            .submit(&gst_template(), &[], "Task Attachment")
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Cancelled { ref created } if created.is_empty()));
        assert!(api.calls().is_empty());
    }
}

mod cache_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_submission_invalidates_task_cache() {
        let api = MemoryTaskApi::new();
        let cache = ListCache::new(Duration::from_secs(300));

        let before = cache.get_or_fetch(|| fetch_all_tasks(&api, 2)).await.unwrap();
        assert!(before.is_empty());
        assert!(cache.is_fresh().await);

        TaskSubmitter::new(&api)
            .with_task_cache(&cache)
            .submit(&gst_template(), &[], "Task Attachment")
            .await
            .unwrap();
        assert!(!cache.is_fresh().await);

        let after = cache.get_or_fetch(|| fetch_all_tasks(&api, 2)).await.unwrap();
        let ids: Vec<_> = after.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![TaskId::from(1), TaskId::from(2), TaskId::from(3), TaskId::from(4)]);
        assert_eq!(after[3].dependent_task_id, Some(TaskId::from(3)));
    }

    #[tokio::test]
    async fn test_memory_api_dry_run_records_chain_and_documents() {
        let api = MemoryTaskApi::starting_at(500);
        let files = attachments(&["a.pdf", "b.pdf"]);

        let outcome = TaskSubmitter::new(&api)
            .submit(&gst_template(), &files, "Compliance Evidence")
            .await
            .unwrap();

        assert_eq!(outcome.head(), Some(&TaskId::from(500)));
        let documents = api.documents();
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.task_id == TaskId::from(500)));
        assert!(documents.iter().all(|d| d.document_type == "Compliance Evidence"));
    }
}
