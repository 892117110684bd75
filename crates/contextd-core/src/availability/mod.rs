//! Availability reasoning: free/busy decisions, conflicts, and earliest
//! free slots over a set of calendar events.
//!
//! The decider is purely functional -- given identical `(query, events,
//! config, now)` it produces identical output, and it never errors: a query
//! with no recognizable time expression comes back as `unknown`.

pub mod block;
pub mod conflict;
pub mod slots;

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::timeparse::{parse_slot_intent, parse_window, SlotIntent, DEFAULT_DURATION_MIN};
use crate::types::Source;

pub use block::{
    blocks_from_events, events_from_items, events_from_values, expand_all_day, merge_blocks,
    BusyBlock, Event,
};
pub use conflict::{find_conflicts, overlaps};
pub use slots::{
    suggest_in_window, suggest_slots, work_window_for, SuggestedSlot, DEFAULT_SUGGESTIONS,
};

/// Free/busy verdict for the parsed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Free,
    Busy,
    Unknown,
}

/// One conflicting calendar event, original title and span preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub source: Source,
}

impl Conflict {
    fn from_block(b: &BusyBlock) -> Self {
        Self {
            title: b.title.clone(),
            start: b.start.to_rfc3339_opts(SecondsFormat::Secs, false),
            end: b.end.to_rfc3339_opts(SecondsFormat::Secs, false),
            all_day: b.all_day,
            source: Source::Calendar,
        }
    }
}

/// Decision record handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub availability: Availability,
    pub conflicts: Vec<Conflict>,
    pub explanation: String,
    pub suggested_slots: Vec<SuggestedSlot>,
}

impl AvailabilityResult {
    fn unknown(explanation: &str, suggested_slots: Vec<SuggestedSlot>) -> Self {
        Self {
            availability: Availability::Unknown,
            conflicts: Vec::new(),
            explanation: explanation.to_string(),
            suggested_slots,
        }
    }
}

/// Decide free/busy for the query against the given calendar events.
///
/// - Parses a free/busy window (24h clock, dayparts, "next <weekday>").
/// - Computes conflicts against the events, honoring all-day spans and the
///   configured edge policy.
/// - Range queries that conflict also get earliest in-window slots for the
///   requested duration; free range queries get them when the query itself
///   carries a day-window slot intent.
/// - Queries with no window fall through to the standalone slot-intent
///   path (working-hours clamped).
pub fn decide_availability(
    query: &str,
    events: &[Event],
    cfg: &Config,
    now: DateTime<Tz>,
) -> AvailabilityResult {
    let tz = now.timezone();
    let blocks = blocks_from_events(events, tz);
    let merged = merge_blocks(expand_all_day(&blocks), cfg.edge_policy);

    let Some(window) = parse_window(query, now) else {
        let suggestions = suggest_slots(query, events, cfg, now, DEFAULT_SUGGESTIONS);
        if !suggestions.is_empty() {
            return AvailabilityResult::unknown("Suggested slots available.", suggestions);
        }
        return AvailabilityResult::unknown(
            "Could not resolve a specific time window.",
            Vec::new(),
        );
    };

    let conflicting = find_conflicts(&blocks, &window, cfg.edge_policy);
    if !conflicting.is_empty() {
        let conflicts: Vec<Conflict> = conflicting.iter().map(Conflict::from_block).collect();
        let first = &conflicting[0];

        if window.is_point() {
            return AvailabilityResult {
                availability: Availability::Busy,
                explanation: format!(
                    "Conflicts with {} at {}.",
                    first.title,
                    first.start.format("%H:%M")
                ),
                conflicts,
                suggested_slots: Vec::new(),
            };
        }

        // Range conflict: propose earliest in-window slots, honoring a
        // requested duration when the query carried a day-window intent.
        let requested = match parse_slot_intent(query, now) {
            Some(SlotIntent::DayWindow { duration_min, .. }) => duration_min,
            _ => DEFAULT_DURATION_MIN,
        };
        let suggestions =
            suggest_in_window(&merged, window.start, window.end, requested, DEFAULT_SUGGESTIONS);

        return AvailabilityResult {
            availability: Availability::Busy,
            explanation: format!(
                "Conflicts with {} {}–{}.",
                first.title,
                first.start.format("%H:%M"),
                first.end.format("%H:%M")
            ),
            conflicts,
            suggested_slots: suggestions,
        };
    }

    // No conflicts. If the query asked for a duration over a day window,
    // propose the earliest slots inside the parsed window as well.
    if let Some(SlotIntent::DayWindow { duration_min, .. }) = parse_slot_intent(query, now) {
        let suggestions = suggest_in_window(
            &merged,
            window.start,
            window.end,
            duration_min,
            DEFAULT_SUGGESTIONS,
        );
        if !suggestions.is_empty() {
            return AvailabilityResult {
                availability: Availability::Free,
                conflicts: Vec::new(),
                explanation: "Window is free; suggested earliest slots.".to_string(),
                suggested_slots: suggestions,
            };
        }
    }

    AvailabilityResult {
        availability: Availability::Free,
        conflicts: Vec::new(),
        explanation: "No conflicts in the requested window.".to_string(),
        suggested_slots: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Timelike};
    use chrono_tz::America::Chicago;

    // 2025-03-03 08:30, a Monday.
    fn now() -> DateTime<Tz> {
        Chicago.with_ymd_and_hms(2025, 3, 3, 8, 30, 0).unwrap()
    }

    fn iso(dt: DateTime<Tz>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    fn event(title: &str, start: DateTime<Tz>, end: DateTime<Tz>, all_day: bool) -> Event {
        Event {
            title: title.to_string(),
            start: iso(start),
            end: iso(end),
            all_day,
        }
    }

    fn tomorrow_at(h: u32, m: u32) -> DateTime<Tz> {
        crate::clock::at_time(now() + Duration::days(1), crate::clock::clamp_hm(h, m))
    }

    fn today_at(h: u32, m: u32) -> DateTime<Tz> {
        crate::clock::at_time(now(), crate::clock::clamp_hm(h, m))
    }

    fn local(slot_start: &str) -> DateTime<Tz> {
        slot_start
            .parse::<DateTime<chrono::FixedOffset>>()
            .unwrap()
            .with_timezone(&Chicago)
    }

    #[test]
    fn busy_at_tomorrow_10_point_check() {
        let events = [event("Project Sync", tomorrow_at(10, 0), tomorrow_at(11, 0), false)];
        let res = decide_availability("am I free tomorrow at 10?", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        assert_eq!(res.conflicts[0].title, "Project Sync");
        assert_eq!(res.explanation, "Conflicts with Project Sync at 10:00.");
        assert!(res.suggested_slots.is_empty());
    }

    #[test]
    fn free_at_tomorrow_11_boundary_exclusive() {
        let events = [event("Standup", tomorrow_at(10, 0), tomorrow_at(11, 0), false)];
        let res = decide_availability("am I free tomorrow at 11?", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Free);
        assert!(res.conflicts.is_empty());
        assert_eq!(res.explanation, "No conflicts in the requested window.");
    }

    #[test]
    fn boundary_point_busy_under_inclusive_policy() {
        let mut cfg = Config::default();
        cfg.edge_policy = crate::config::EdgePolicy::Inclusive;
        let events = [event("Standup", tomorrow_at(10, 0), tomorrow_at(11, 0), false)];
        let res = decide_availability("tomorrow 11:00", &events, &cfg, now());
        assert_eq!(res.availability, Availability::Busy);
    }

    #[test]
    fn all_day_blocks_daypart() {
        let events = [event("OOO", tomorrow_at(0, 0), tomorrow_at(0, 0) + Duration::days(1), true)];
        let res = decide_availability("tomorrow afternoon", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        assert_eq!(res.conflicts[0].title, "OOO");
        assert!(res.conflicts[0].all_day);
    }

    #[test]
    fn after_time_suggests_earliest_free_segment_today() {
        let res =
            decide_availability("book 30 min after 15:00 today", &[], &Config::default(), now());
        assert_eq!(res.availability, Availability::Unknown);
        assert_eq!(res.explanation, "Suggested slots available.");
        assert!(!res.suggested_slots.is_empty());

        let s0 = local(&res.suggested_slots[0].start);
        let e0 = local(&res.suggested_slots[0].end);
        assert_eq!((s0.hour(), s0.minute()), (15, 0));
        assert_eq!(e0 - s0, Duration::minutes(30));
    }

    #[test]
    fn after_time_respects_existing_block() {
        let events = [event("standup", today_at(15, 0), today_at(15, 30), false)];
        let res = decide_availability(
            "book 30 min after 15:00 today",
            &events,
            &Config::default(),
            now(),
        );
        let s0 = local(&res.suggested_slots[0].start);
        let e0 = local(&res.suggested_slots[0].end);
        assert_eq!((s0.hour(), s0.minute()), (15, 30));
        assert_eq!(e0 - s0, Duration::minutes(30));
    }

    #[test]
    fn busy_daypart_still_suggests_inside_window() {
        let events = [event("m2 test", tomorrow_at(15, 0), tomorrow_at(16, 0), false)];
        let res =
            decide_availability("any slot tomorrow afternoon", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        assert!(res.conflicts.iter().any(|c| c.title == "m2 test"));
        assert!(!res.suggested_slots.is_empty());

        // Suggested inside 12:00-17:00, avoiding 15:00-16:00.
        let s0 = local(&res.suggested_slots[0].start);
        assert!((12..15).contains(&s0.hour()) || (16..17).contains(&s0.hour()));
        assert_eq!(
            res.explanation,
            "Conflicts with m2 test 15:00–16:00."
        );
    }

    #[test]
    fn free_range_with_duration_intent_gets_suggestions() {
        let res = decide_availability(
            "any slot tomorrow afternoon for 60 min",
            &[],
            &Config::default(),
            now(),
        );
        assert_eq!(res.availability, Availability::Free);
        assert_eq!(res.explanation, "Window is free; suggested earliest slots.");
        let s0 = local(&res.suggested_slots[0].start);
        let e0 = local(&res.suggested_slots[0].end);
        assert_eq!((s0.hour(), s0.minute()), (12, 0));
        assert_eq!(e0 - s0, Duration::minutes(60));
    }

    #[test]
    fn unparseable_query_is_unknown() {
        let res = decide_availability("tell me a joke", &[], &Config::default(), now());
        assert_eq!(res.availability, Availability::Unknown);
        assert_eq!(res.explanation, "Could not resolve a specific time window.");
        assert!(res.conflicts.is_empty());
        assert!(res.suggested_slots.is_empty());
    }

    #[test]
    fn malformed_events_are_ignored() {
        let mut bad = event("broken", tomorrow_at(10, 0), tomorrow_at(11, 0), false);
        bad.start = "banana".to_string();
        let res = decide_availability("am I free tomorrow at 10?", &[bad], &Config::default(), now());
        assert_eq!(res.availability, Availability::Free);
    }

    #[test]
    fn range_conflict_suggestions_avoid_busy_blocks() {
        let events = [
            event("a", tomorrow_at(12, 0), tomorrow_at(13, 0), false),
            event("b", tomorrow_at(13, 0), tomorrow_at(14, 0), false),
        ];
        let res =
            decide_availability("any slot tomorrow afternoon", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        // Merged 12:00-14:00; first free segment starts at 14:00.
        let s0 = local(&res.suggested_slots[0].start);
        assert_eq!((s0.hour(), s0.minute()), (14, 0));
    }

    #[test]
    fn conflicts_report_original_spans_for_all_day() {
        let start = tomorrow_at(9, 17);
        let events = [event("OOO", start, start + Duration::hours(1), true)];
        let res = decide_availability("tomorrow at 8", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        // The reported span is the stored event span, not the expanded day.
        assert_eq!(res.conflicts[0].start, iso(start));
    }

    #[test]
    fn decider_is_deterministic() {
        let events = [event("Project Sync", tomorrow_at(10, 0), tomorrow_at(11, 0), false)];
        let a = decide_availability("am I free tomorrow at 10?", &events, &Config::default(), now());
        let b = decide_availability("am I free tomorrow at 10?", &events, &Config::default(), now());
        assert_eq!(a, b);
    }

    #[test]
    fn point_conflict_reports_single_block_first() {
        let events = [
            event("later", tomorrow_at(9, 0), tomorrow_at(12, 0), false),
            event("earlier", tomorrow_at(8, 0), tomorrow_at(11, 0), false),
        ];
        let res = decide_availability("tomorrow at 10", &events, &Config::default(), now());
        assert_eq!(res.availability, Availability::Busy);
        assert_eq!(res.conflicts.len(), 2);
        // Sorted by start: "earlier" leads and names the explanation.
        assert_eq!(res.conflicts[0].title, "earlier");
        assert!(res.explanation.starts_with("Conflicts with earlier at"));
    }
}
