//! Keyword intent routing.
//!
//! Routes a query to one source with ordered first-match vocabulary
//! checks: calendar terms win over notes terms, which win over code
//! terms. No match is `General`, and the query route fans out across
//! every source.

use serde::{Deserialize, Serialize};

use crate::types::Source;

/// High-level intent of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Calendar,
    Notes,
    Code,
    General,
}

impl IntentKind {
    /// The source backing this intent, if it names one.
    pub fn source(self) -> Option<Source> {
        match self {
            IntentKind::Calendar => Some(Source::Calendar),
            IntentKind::Notes => Some(Source::Notes),
            IntentKind::Code => Some(Source::Code),
            IntentKind::General => None,
        }
    }
}

/// Free/busy, slots, booking, day words, dayparts.
const CALENDAR_TERMS: &[&str] = &[
    "am i free",
    "free at",
    "busy at",
    "tomorrow",
    "today",
    "next ",
    "slot",
    "book",
    "schedule",
    "reschedule",
    "morning",
    "afternoon",
    "evening",
];

const NOTES_TERMS: &[&str] = &["notes", "meeting notes", "wiki", "doc"];

const CODE_TERMS: &[&str] = &["github", "pr ", "issue "];

/// Classify the query's intent. First match wins, calendar terms first.
pub fn classify(query: &str) -> IntentKind {
    let text = query.to_lowercase();
    let hit = |terms: &[&str]| terms.iter().any(|t| text.contains(t));

    if hit(CALENDAR_TERMS) {
        IntentKind::Calendar
    } else if hit(NOTES_TERMS) {
        IntentKind::Notes
    } else if hit(CODE_TERMS) {
        IntentKind::Code
    } else {
        IntentKind::General
    }
}
