//! Configuration for the task service client and recurrence defaults.
//!
//! Values come from a TOML file (`--config`, `$CTASK_CONFIG` or
//! `~/.ctask/config.toml`), then command-line flags and environment
//! variables override individual fields.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::expand::ExpandOptions;
use crate::fields::{DescriptionSuffix, Span};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_DOCUMENT_TYPE: &str = "Task Attachment";

/// Client and expansion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Years covered by a recurring series. Ignored when `occurrences` is set.
    pub span_years: u32,
    pub occurrences: Option<u32>,
    pub annotate_descriptions: bool,
    pub document_type: String,
    /// How long a fetched task list stays fresh.
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 10,
            span_years: 1,
            occurrences: None,
            annotate_descriptions: false,
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            cache_ttl_secs: 300,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if present.
    ///
    /// A missing default file yields [`Config::default`]; a missing explicit
    /// file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Expansion options implied by the span and annotation settings.
    pub fn expand_options(&self) -> ExpandOptions {
        ExpandOptions {
            span: match self.occurrences {
                Some(n) => Span::Occurrences(n),
                None => Span::Years(self.span_years),
            },
            suffix: if self.annotate_descriptions {
                DescriptionSuffix::Occurrence
            } else {
                DescriptionSuffix::None
            },
        }
    }
}

/// `$CTASK_CONFIG`, else `$HOME/.ctask/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CTASK_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".ctask").join("config.toml"))
}
