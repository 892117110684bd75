//! Context packing: a short, dense summary of retrieved items.

use crate::types::{ContextItem, ContextPackage};

/// Items folded into the summary body.
const MAX_SUMMARY_ITEMS: usize = 6;

/// Titles surfaced as highlights.
const MAX_HIGHLIGHTS: usize = 3;

/// Summarize items into a budgeted package.
///
/// The budget is a naive whitespace token count; over-budget summaries are
/// word-truncated with a trailing `...`.
pub fn summarize(items: &[ContextItem], max_tokens: usize) -> ContextPackage {
    if items.is_empty() {
        return ContextPackage {
            tokens: 0,
            summary: "No context found.".to_string(),
            highlights: Vec::new(),
        };
    }

    let lines: Vec<String> = items
        .iter()
        .take(MAX_SUMMARY_ITEMS)
        .map(|it| format!("- [{}] {}: {}", it.source, it.title, it.snippet))
        .collect();
    let raw = lines.join("\n");

    let words: Vec<&str> = raw.split_whitespace().collect();
    let summary = if words.len() > max_tokens {
        let kept = &words[..max_tokens.saturating_sub(3)];
        let mut s = kept.join(" ");
        s.push_str(" ...");
        s
    } else {
        raw
    };

    let highlights = items
        .iter()
        .take(MAX_HIGHLIGHTS)
        .map(|it| it.title.clone())
        .collect();

    ContextPackage {
        tokens: summary.split_whitespace().count().max(1),
        summary,
        highlights,
    }
}
