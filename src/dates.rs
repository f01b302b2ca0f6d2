//! Deadline parsing and relative formatting.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::ValidationError;

/// Parse a human-readable deadline relative to `today`.
///
/// Supports:
/// - "today", "tomorrow"
/// - "end of month" / "eom", "end of quarter" / "eoq", "end of year" / "eoy"
/// - "in 3d", "in 2w", "in 1m" (calendar months), "in 1y"
/// - "YYYY-MM-DD"
pub fn parse_deadline(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let s = input.trim().to_lowercase();
    let invalid = || ValidationError::InvalidDeadline(input.to_string());

    match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)).ok_or_else(invalid),
        "end of month" | "eom" => return end_of_month(today).ok_or_else(invalid),
        "end of quarter" | "eoq" => {
            let quarter_end_month = (today.month0() / 3) * 3 + 3;
            let last_month = NaiveDate::from_ymd_opt(today.year(), quarter_end_month, 1)
                .ok_or_else(invalid)?;
            return end_of_month(last_month).ok_or_else(invalid);
        }
        "end of year" | "eoy" => {
            return NaiveDate::from_ymd_opt(today.year(), 12, 31).ok_or_else(invalid);
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (split, _) = rest.char_indices().last().ok_or_else(invalid)?;
        let (amount, unit) = rest.split_at(split);
        let amount: u32 = amount.trim().parse().map_err(|_| invalid())?;
        let date = match unit {
            "d" => today.checked_add_days(Days::new(u64::from(amount))),
            "w" => today.checked_add_days(Days::new(u64::from(amount) * 7)),
            "m" => today.checked_add_months(Months::new(amount)),
            "y" => amount.checked_mul(12).and_then(|m| today.checked_add_months(Months::new(m))),
            _ => None,
        };
        return date.ok_or_else(invalid);
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

/// Format a deadline relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}
