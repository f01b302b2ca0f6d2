//! # compliance_tasks
//!
//! Recurring compliance task generation and chained submission.
//!
//! A fund manager's compliance calendar is full of tasks that repeat: GST
//! returns every quarter, NAV reports every month, FATCA filings every year.
//! This crate turns one task template into its dated occurrences and creates
//! them on the task service as a linear chain, each occurrence depending on
//! the one before it.
//!
//! ## Pipeline
//!
//! 1. [`expand::expand`] computes the occurrences with calendar arithmetic.
//! 2. [`chain::DependencyChain`] links each occurrence to its predecessor as
//!    ids come back from the server.
//! 3. [`submit::TaskSubmitter`] creates the chain sequentially and uploads
//!    attachments to the head task.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::NaiveDate;
//! use compliance_tasks::client::HttpTaskApi;
//! use compliance_tasks::fields::Recurrence;
//! use compliance_tasks::submit::TaskSubmitter;
//! use compliance_tasks::task::TaskTemplate;
//!
//! let api = HttpTaskApi::new(
//!     "https://compliance.example.com/api",
//!     None,
//!     std::time::Duration::from_secs(10),
//! )?;
//! let deadline = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//! let template = TaskTemplate::new("File GST return", deadline)
//!     .with_recurrence(Recurrence::Quarterly);
//! let outcome = TaskSubmitter::new(&api).submit(&template, &[], "Task Attachment").await?;
//! println!("created {:?}", outcome.task_ids);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chain;
pub mod cli;
pub mod client;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod display;
pub mod error;
pub mod expand;
pub mod fields;
pub mod submit;
pub mod task;

pub use error::{ApiError, ChainError, SubmitError, ValidationError};
pub use expand::{expand, ExpandOptions};
pub use submit::{SubmitOutcome, TaskSubmitter};
pub use task::{Attachment, TaskId, TaskInstance, TaskTemplate};
