//! Wire-facing context types shared by the providers, the summarizer, and
//! the HTTP layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin of a context item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Calendar,
    Notes,
    Code,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Calendar => write!(f, "calendar"),
            Source::Notes => write!(f, "notes"),
            Source::Code => write!(f, "code"),
        }
    }
}

/// Source selector accepted in query requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelect {
    Calendar,
    Notes,
    Code,
    All,
}

impl SourceSelect {
    /// The concrete source this selector names, if any.
    pub fn source(self) -> Option<Source> {
        match self {
            SourceSelect::Calendar => Some(Source::Calendar),
            SourceSelect::Notes => Some(Source::Notes),
            SourceSelect::Code => Some(Source::Code),
            SourceSelect::All => None,
        }
    }
}

/// One piece of retrieved context.
///
/// Calendar items carry `start`, `end`, and optionally `all_day`/`title`
/// in their metadata bag; the availability engine reads events from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub source: Source,
    pub title: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Summarized context handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPackage {
    pub tokens: usize,
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}
