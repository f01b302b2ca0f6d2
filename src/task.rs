//! Task data structures exchanged with the compliance task service.
//!
//! A [`TaskTemplate`] is what a user fills in; a [`TaskInstance`] is one
//! concrete, dated task ready to be created remotely.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::fields::Recurrence;

/// Server-assigned identifier of a task or document.
///
/// Servers answer with either JSON strings or integers; both are accepted
/// and the value is kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        TaskId(n.to_string())
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => TaskId(s),
            Raw::Number(n) => TaskId(n.to_string()),
        })
    }
}

/// The user-authored base of one or more tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub description: String,
    /// Anchor deadline; the first occurrence is due on exactly this date.
    pub deadline: NaiveDate,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default)]
    pub approver_id: Option<String>,
    /// Externally supplied predecessor of the first occurrence.
    #[serde(default)]
    pub dependent_task_id: Option<TaskId>,
    /// Pass-through fields copied verbatim into every instance.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl TaskTemplate {
    pub fn new(description: impl Into<String>, deadline: NaiveDate) -> Self {
        Self {
            description: description.into(),
            deadline,
            recurrence: None,
            category: None,
            assignee_id: None,
            reviewer_id: None,
            approver_id: None,
            dependent_task_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn with_predecessor(mut self, id: TaskId) -> Self {
        self.dependent_task_id = Some(id);
        self
    }

    /// Add a pass-through field from `key=value` input.
    ///
    /// Values that parse as JSON (numbers, booleans, quoted strings) keep
    /// their type; anything else is stored as a string.
    pub fn insert_field(&mut self, raw: &str) -> Result<(), ValidationError> {
        let (key, value) = raw
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, _)| !k.is_empty())
            .ok_or_else(|| ValidationError::InvalidField(raw.to_string()))?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        self.extra.insert(key.to_string(), value);
        Ok(())
    }

    /// Reject templates that can never produce a valid task.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// One concrete task to be created remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Zero-based position within the series. Not sent to the server.
    #[serde(skip)]
    pub occurrence: u32,
    pub description: String,
    pub deadline: NaiveDate,
    pub recurrence: Option<Recurrence>,
    pub category: Option<String>,
    pub assignee_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub approver_id: Option<String>,
    /// Back reference to the previously created task. Assigned while the
    /// chain is submitted.
    pub dependent_task_id: Option<TaskId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskInstance {
    pub(crate) fn from_template(
        template: &TaskTemplate,
        occurrence: u32,
        description: String,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            occurrence,
            description,
            deadline,
            recurrence: template.recurrence,
            category: template.category.clone(),
            assignee_id: template.assignee_id.clone(),
            reviewer_id: template.reviewer_id.clone(),
            approver_id: template.approver_id.clone(),
            dependent_task_id: None,
            extra: template.extra.clone(),
        }
    }
}

/// Task record returned by the creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: TaskId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Document record returned by the attachment endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub id: TaskId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Task as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dependent_task_id: Option<TaskId>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// A file to be uploaded and associated with a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an attachment from disk, naming it after the file.
    pub async fn read(path: &std::path::Path) -> Result<Self, ValidationError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationError::UnreadableAttachment {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self { file_name, bytes })
    }
}
