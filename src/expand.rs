//! Expansion of a task template into dated occurrences.
//!
//! Occurrence `i` is due `i` recurrence periods after the anchor deadline.
//! Each deadline is computed from the anchor rather than from the previous
//! occurrence, so month-end clamping never accumulates: a series anchored
//! on Jan 31 is due Feb 28, Mar 31, Apr 30 and so on.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fields::{DescriptionSuffix, Recurrence, Span, MAX_OCCURRENCES};
use crate::task::{TaskInstance, TaskTemplate};

/// Knobs that differ between callers of the expander.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandOptions {
    pub span: Span,
    pub suffix: DescriptionSuffix,
}

impl ExpandOptions {
    pub fn years(years: u32) -> Self {
        Self {
            span: Span::Years(years),
            ..Self::default()
        }
    }

    pub fn with_suffix(mut self, suffix: DescriptionSuffix) -> Self {
        self.suffix = suffix;
        self
    }
}

/// Expand `template` into the ordered list of instances to create.
///
/// Non-recurring templates yield exactly one instance identical to the
/// template. Dependencies are left unset; they are assigned while the
/// chain is submitted. Spans above [`MAX_OCCURRENCES`] or past the end of
/// the calendar are rejected before anything is built.
pub fn expand(
    template: &TaskTemplate,
    options: &ExpandOptions,
) -> Result<Vec<TaskInstance>, ValidationError> {
    template.validate()?;

    let Some(recurrence) = template.recurrence else {
        return Ok(vec![TaskInstance::from_template(
            template,
            0,
            template.description.clone(),
            template.deadline,
        )]);
    };

    if options.span.is_empty() {
        return Err(ValidationError::EmptySpan);
    }

    let requested = options.span.occurrences(recurrence);
    if requested > MAX_OCCURRENCES {
        return Err(ValidationError::SpanTooLarge {
            requested,
            max: MAX_OCCURRENCES,
        });
    }
    let count = requested as u32;
    let last = count - 1;
    if advance(template.deadline, recurrence, last).is_none() {
        return Err(ValidationError::DeadlineOverflow { occurrence: last });
    }

    let mut instances = Vec::with_capacity(count as usize);
    for occurrence in 0..count {
        let deadline = advance(template.deadline, recurrence, occurrence)
            .ok_or(ValidationError::DeadlineOverflow { occurrence })?;
        let description = match options.suffix {
            DescriptionSuffix::None => template.description.clone(),
            DescriptionSuffix::Occurrence => {
                format!("{} #{} {}", template.description, recurrence, occurrence + 1)
            }
        };
        instances.push(TaskInstance::from_template(template, occurrence, description, deadline));
    }

    tracing::debug!(
        recurrence = %recurrence,
        count,
        first = %template.deadline,
        "expanded recurring template"
    );
    Ok(instances)
}

/// Move `anchor` forward by `periods` units of `recurrence` with calendar
/// arithmetic. Returns `None` past the representable range.
pub fn advance(anchor: NaiveDate, recurrence: Recurrence, periods: u32) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Weekly => anchor.checked_add_days(Days::new(u64::from(periods) * 7)),
        Recurrence::Monthly => anchor.checked_add_months(Months::new(periods)),
        Recurrence::Quarterly => anchor.checked_add_months(Months::new(periods.checked_mul(3)?)),
        Recurrence::Yearly => anchor.checked_add_months(Months::new(periods.checked_mul(12)?)),
    }
}
