//! Error types for task expansion, remote calls and chained submission.

use std::time::Duration;

use thiserror::Error;

use crate::task::TaskId;

/// Rejected input. Always raised before any remote call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown recurrence '{0}' (expected Weekly, Monthly, Quarterly or Yearly)")]
    UnknownRecurrence(String),

    #[error("task description must not be empty")]
    EmptyDescription,

    #[error("recurrence span must cover at least one occurrence")]
    EmptySpan,

    #[error("span of {requested} occurrences exceeds the limit of {max}")]
    SpanTooLarge { requested: u64, max: u64 },

    #[error("deadline overflows the calendar at occurrence {occurrence}")]
    DeadlineOverflow { occurrence: u32 },

    #[error("invalid deadline '{0}' (use YYYY-MM-DD, today, tomorrow or in Nd/Nw/Nm)")]
    InvalidDeadline(String),

    #[error("invalid pass-through field '{0}' (expected key=value)")]
    InvalidField(String),

    #[error("cannot read attachment {path}: {reason}")]
    UnreadableAttachment { path: String, reason: String },
}

/// Failure of a single call against the task or document endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    /// Refused by the in-process service.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Misuse of the dependency chain state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("invalid chain transition: cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A single attachment that failed to upload.
#[derive(Debug)]
pub struct AttachmentFailure {
    pub name: String,
    pub error: ApiError,
}

/// Consolidated failure of a task submission.
///
/// Every variant raised after the first remote call carries the ids of
/// the tasks that already exist server-side.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "creating occurrence {occurrence} failed after {} task(s) were created: {source}",
        created.len()
    )]
    RemoteCreation {
        occurrence: u32,
        created: Vec<TaskId>,
        #[source]
        source: ApiError,
    },

    #[error("submission cancelled after {} task(s) were created", created.len())]
    Cancelled { created: Vec<TaskId> },

    #[error("{} attachment upload(s) failed for task {}", failures.len(), head_id(task_ids))]
    AttachmentUpload {
        task_ids: Vec<TaskId>,
        document_ids: Vec<TaskId>,
        failures: Vec<AttachmentFailure>,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

fn head_id(ids: &[TaskId]) -> String {
    ids.first().map(ToString::to_string).unwrap_or_else(|| "-".into())
}

impl SubmitError {
    /// Ids of tasks created before the failure, in chain order.
    pub fn created_ids(&self) -> &[TaskId] {
        match self {
            SubmitError::RemoteCreation { created, .. } | SubmitError::Cancelled { created } => {
                created
            }
            SubmitError::AttachmentUpload { task_ids, .. } => task_ids,
            SubmitError::Validation(_) | SubmitError::Chain(_) => &[],
        }
    }
}
