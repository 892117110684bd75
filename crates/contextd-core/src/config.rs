//! Configuration record and loading.
//!
//! All keys are enumerated here with defaults filled at load. The record is
//! an immutable, process-wide snapshot passed by reference; nothing in the
//! core re-reads the environment after startup.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rule for interval endpoint inclusion when testing overlap.
///
/// Under `ExclusiveEnd` (the default) back-to-back events do not conflict;
/// under `Inclusive` they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    #[default]
    ExclusiveEnd,
    Inclusive,
}

impl EdgePolicy {
    /// Parse the documented config value. Unknown values return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exclusive_end" => Some(Self::ExclusiveEnd),
            "inclusive" => Some(Self::Inclusive),
            _ => None,
        }
    }
}

/// Process-wide configuration snapshot.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Deployment environment label ("local", "staging", ...).
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// IANA zone name used to anchor query parsing and event normalization.
    #[serde(default = "default_tz")]
    pub default_tz: String,

    /// Start of working hours, "HH:MM".
    #[serde(default = "default_work_hours_start")]
    pub work_hours_start: String,

    /// End of working hours, "HH:MM".
    #[serde(default = "default_work_hours_end")]
    pub work_hours_end: String,

    /// Endpoint inclusion rule for overlap tests.
    #[serde(default)]
    pub edge_policy: EdgePolicy,

    /// ICS feed URL for the live calendar provider. When unset, the demo
    /// calendar provider is used instead.
    #[serde(default)]
    pub calendar_ics_url: Option<String>,

    /// Bearer token for the note-store provider.
    #[serde(default)]
    pub notes_api_token: Option<String>,

    /// Bearer token for the code-forge provider.
    #[serde(default)]
    pub code_api_token: Option<String>,
}

fn default_app_env() -> String {
    "local".to_string()
}

fn default_tz() -> String {
    "America/Chicago".to_string()
}

fn default_work_hours_start() -> String {
    "09:00".to_string()
}

fn default_work_hours_end() -> String {
    "18:00".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: default_app_env(),
            default_tz: default_tz(),
            work_hours_start: default_work_hours_start(),
            work_hours_end: default_work_hours_end(),
            edge_policy: EdgePolicy::default(),
            calendar_ics_url: None,
            notes_api_token: None,
            code_api_token: None,
        }
    }
}

impl Config {
    /// Build a config from process environment variables, falling back to
    /// defaults for absent keys. An unrecognized edge policy value keeps
    /// the default and logs a warning.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();

        if let Ok(v) = env::var("APP_ENV") {
            cfg.app_env = v;
        }
        if let Ok(v) = env::var("DEFAULT_TZ") {
            cfg.default_tz = v;
        }
        if let Ok(v) = env::var("WORK_HOURS_START") {
            cfg.work_hours_start = v;
        }
        if let Ok(v) = env::var("WORK_HOURS_END") {
            cfg.work_hours_end = v;
        }
        if let Ok(v) = env::var("AVAILABILITY_EDGE_POLICY") {
            match EdgePolicy::parse(&v) {
                Some(policy) => cfg.edge_policy = policy,
                None => {
                    tracing::warn!(value = %v, "unknown edge policy, keeping exclusive_end")
                }
            }
        }
        cfg.calendar_ics_url = env::var("CALENDAR_ICS_URL").ok().filter(|v| !v.is_empty());
        cfg.notes_api_token = env::var("NOTES_API_TOKEN").ok().filter(|v| !v.is_empty());
        cfg.code_api_token = env::var("CODE_API_TOKEN").ok().filter(|v| !v.is_empty());

        cfg
    }

    /// Parse a config from a TOML document. Absent keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a config from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}
