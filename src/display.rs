//! Table output for the command line.

use chrono::NaiveDate;

use crate::dates::format_due_relative;
use crate::task::{TaskId, TaskInstance, TaskRecord};

/// Print expanded instances, optionally with the ids they were created as.
pub fn print_instances(instances: &[TaskInstance], ids: Option<&[TaskId]>, today: NaiveDate) {
    println!(
        "{:<4} {:<10} {:<12} {:<11} {:<12} {}",
        "#", "ID", "Deadline", "Due", "Depends on", "Description"
    );
    for (i, instance) in instances.iter().enumerate() {
        let id = ids.and_then(|ids| ids.get(i)).map(ToString::to_string);
        let depends = instance
            .dependent_task_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<4} {:<10} {:<12} {:<11} {:<12} {}",
            instance.occurrence + 1,
            truncate(id.as_deref().unwrap_or("-"), 10),
            instance.deadline,
            format_due_relative(instance.deadline, today),
            truncate(&depends, 12),
            instance.description
        );
    }
}

/// Print tasks as listed by the service.
pub fn print_records(records: &[TaskRecord], today: NaiveDate) {
    println!(
        "{:<10} {:<12} {:<11} {:<14} {:<12} {}",
        "ID", "Deadline", "Due", "Category", "Depends on", "Description"
    );
    for r in records {
        let deadline = r.deadline.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let due = r
            .deadline
            .map(|d| format_due_relative(d, today))
            .unwrap_or_else(|| "-".into());
        let depends = r
            .dependent_task_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {:<12} {:<11} {:<14} {:<12} {}",
            truncate(r.id.as_str(), 10),
            deadline,
            due,
            truncate(r.category.as_deref().unwrap_or("-"), 14),
            truncate(&depends, 12),
            r.description.as_deref().unwrap_or("")
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
