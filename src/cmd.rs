//! Command implementations for the CLI interface.
//!
//! Each subcommand builds a [`TaskTemplate`] or a listing request from its
//! arguments and hands it to the library: `expand` previews occurrences
//! without any I/O, `submit` creates the chain, `list` reads tasks back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tokio_util::sync::CancellationToken;

use crate::cache::{fetch_all_tasks, ListCache, DEFAULT_PAGE_SIZE};
use crate::cli::Cli;
use crate::client::{HttpTaskApi, MemoryTaskApi, TaskApi};
use crate::config::Config;
use crate::dates::parse_deadline;
use crate::display::{print_instances, print_records};
use crate::error::{SubmitError, ValidationError};
use crate::expand::{expand, ExpandOptions};
use crate::fields::{DescriptionSuffix, Recurrence, Span};
use crate::submit::TaskSubmitter;
use crate::task::{Attachment, TaskId, TaskTemplate};

#[derive(Subcommand)]
pub enum Commands {
    /// Preview the occurrences a template expands into.
    Expand {
        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Create a task, or a chain of recurring tasks, on the service.
    Submit {
        #[command(flatten)]
        template: TemplateArgs,
        /// File to attach to the first task. May be repeated.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
        /// Document type label for attachments.
        #[arg(long)]
        document_type: Option<String>,
        /// Run against an in-memory service and print what would be created.
        #[arg(long)]
        dry_run: bool,
    },

    /// List tasks on the service.
    List {
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        /// Fetch every page.
        #[arg(long)]
        all: bool,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Fields of the task form.
#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    /// Task description.
    pub description: String,
    /// Anchor deadline: YYYY-MM-DD, "today", "tomorrow", "eom", "eoq" or "in Nd/Nw/Nm".
    #[arg(long)]
    pub deadline: String,
    /// Recurrence: Weekly | Monthly | Quarterly | Yearly. Omit for a one-off task.
    #[arg(long = "recur")]
    pub recurrence: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub reviewer: Option<String>,
    #[arg(long)]
    pub approver: Option<String>,
    /// Existing task the first occurrence depends on.
    #[arg(long)]
    pub depends_on: Option<String>,
    /// Extra field sent with every occurrence, as key=value. May be repeated.
    #[arg(long = "field")]
    pub fields: Vec<String>,
    /// Years of occurrences to generate.
    #[arg(long, conflicts_with = "occurrences")]
    pub years: Option<u32>,
    /// Exact number of occurrences to generate.
    #[arg(long)]
    pub occurrences: Option<u32>,
    /// Suffix each description with its occurrence number.
    #[arg(long)]
    pub annotate: bool,
}

impl TemplateArgs {
    pub fn to_template(&self, today: NaiveDate) -> Result<TaskTemplate, ValidationError> {
        let deadline = parse_deadline(&self.deadline, today)?;
        let mut template = TaskTemplate::new(self.description.trim(), deadline);
        template.recurrence = match &self.recurrence {
            Some(raw) => Recurrence::parse_optional(raw)?,
            None => None,
        };
        template.category = self.category.clone();
        template.assignee_id = self.assignee.clone();
        template.reviewer_id = self.reviewer.clone();
        template.approver_id = self.approver.clone();
        template.dependent_task_id = self.depends_on.as_deref().map(TaskId::from);
        for field in &self.fields {
            template.insert_field(field)?;
        }
        template.validate()?;
        Ok(template)
    }

    /// Start from the configured options and apply per-command overrides.
    pub fn expand_options(&self, config: &Config) -> ExpandOptions {
        let mut options = config.expand_options();
        if let Some(n) = self.occurrences {
            options.span = Span::Occurrences(n);
        } else if let Some(years) = self.years {
            options.span = Span::Years(years);
        }
        if self.annotate {
            options.suffix = DescriptionSuffix::Occurrence;
        }
        options
    }
}

pub fn cmd_expand(config: &Config, args: &TemplateArgs) -> Result<()> {
    let today = Local::now().date_naive();
    let template = args.to_template(today)?;
    let instances = expand(&template, &args.expand_options(config))?;
    print_instances(&instances, None, today);
    println!("{} occurrence(s)", instances.len());
    Ok(())
}

pub async fn cmd_submit(
    config: &Config,
    args: &TemplateArgs,
    attachment_paths: &[PathBuf],
    document_type: Option<String>,
    dry_run: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let today = Local::now().date_naive();
    let template = args.to_template(today)?;
    let options = args.expand_options(config);
    let document_type = document_type.unwrap_or_else(|| config.document_type.clone());

    let mut attachments = Vec::with_capacity(attachment_paths.len());
    for path in attachment_paths {
        attachments.push(Attachment::read(path).await?);
    }

    if dry_run {
        let api = MemoryTaskApi::new();
        let outcome = TaskSubmitter::new(&api)
            .with_options(options)
            .with_timeout(config.timeout())
            .with_cancellation(cancel)
            .submit(&template, &attachments, &document_type)
            .await?;
        let (ids, instances): (Vec<_>, Vec<_>) = api.tasks().into_iter().unzip();
        print_instances(&instances, Some(ids.as_slice()), today);
        println!(
            "Dry run: {} task(s), {} attachment(s) on task {}",
            outcome.task_ids.len(),
            outcome.document_ids.len(),
            outcome.head().map(ToString::to_string).unwrap_or_default()
        );
        return Ok(());
    }

    let api = HttpTaskApi::from_config(config).context("building HTTP client")?;
    let result = TaskSubmitter::new(&api)
        .with_options(options)
        .with_timeout(config.timeout())
        .with_cancellation(cancel)
        .submit(&template, &attachments, &document_type)
        .await;

    match result {
        Ok(outcome) => {
            println!("Created {} task(s): {}", outcome.task_ids.len(), join_ids(&outcome.task_ids));
            if !outcome.document_ids.is_empty() {
                println!(
                    "Uploaded {} attachment(s): {}",
                    outcome.document_ids.len(),
                    join_ids(&outcome.document_ids)
                );
            }
            Ok(())
        }
        Err(e) => {
            report_partial(&e);
            Err(e.into())
        }
    }
}

fn report_partial(error: &SubmitError) {
    let created = error.created_ids();
    if !created.is_empty() {
        eprintln!("Tasks already created: {}", join_ids(created));
    }
    if let SubmitError::AttachmentUpload { failures, .. } = error {
        for failure in failures {
            eprintln!("  {}: {}", failure.name, failure.error);
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter().map(TaskId::as_str).collect::<Vec<_>>().join(", ")
}

pub async fn cmd_list(config: &Config, page: u32, page_size: u32, all: bool) -> Result<()> {
    let api = HttpTaskApi::from_config(config).context("building HTTP client")?;
    let today = Local::now().date_naive();
    if all {
        let cache = ListCache::new(config.cache_ttl());
        let records = cache.get_or_fetch(|| fetch_all_tasks(&api, page_size)).await?;
        print_records(&records, today);
        println!("{} task(s)", records.len());
    } else {
        let batch = api.list_tasks(page, page_size).await?;
        print_records(&batch.items, today);
        if let Some(total) = batch.total {
            println!("Page {page}: {} of {total} task(s)", batch.items.len());
        }
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
