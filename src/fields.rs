//! Enumerations and field types for recurring task generation.
//!
//! This module defines the recurrence vocabulary, the span of a recurring
//! series and the description annotation styles used when expanding a
//! template into dated task instances.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Period between two generated occurrences of a recurring task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Recurrence {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 4] = [
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Quarterly,
        Recurrence::Yearly,
    ];

    /// Number of occurrences that fit into one calendar year.
    pub fn repetitions_per_year(self) -> u32 {
        match self {
            Recurrence::Weekly => 52,
            Recurrence::Monthly => 12,
            Recurrence::Quarterly => 4,
            Recurrence::Yearly => 1,
        }
    }

    /// Wire and display name, e.g. `"Quarterly"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Quarterly => "Quarterly",
            Recurrence::Yearly => "Yearly",
        }
    }

    /// Parse optional form input where an empty value means "no recurrence".
    pub fn parse_optional(s: &str) -> Result<Option<Recurrence>, ValidationError> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Recurrence::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownRecurrence(s.to_string()))
    }
}

impl TryFrom<String> for Recurrence {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Upper bound on the occurrences a single template may expand into.
pub const MAX_OCCURRENCES: u64 = 10_000;

/// How far a recurring series extends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Span {
    /// Whole years of occurrences (`repetitions_per_year * years`).
    Years(u32),
    /// An explicit total number of occurrences.
    Occurrences(u32),
}

impl Default for Span {
    fn default() -> Self {
        Span::Years(1)
    }
}

impl Span {
    /// Total occurrences this span yields for the given recurrence.
    pub fn occurrences(self, recurrence: Recurrence) -> u64 {
        match self {
            Span::Years(years) => u64::from(recurrence.repetitions_per_year()) * u64::from(years),
            Span::Occurrences(n) => u64::from(n),
        }
    }

    pub(crate) fn is_empty(self) -> bool {
        matches!(self, Span::Years(0) | Span::Occurrences(0))
    }
}

/// Annotation applied to the description of each generated occurrence.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptionSuffix {
    /// Keep the template description as is.
    #[default]
    None,
    /// Append `" #<Recurrence> <n>"` with a 1-based occurrence number.
    Occurrence,
}
