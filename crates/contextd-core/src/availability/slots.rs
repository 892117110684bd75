//! Earliest-free-slot search.
//!
//! A cursor sweeps the requested window across the merged busy blocks;
//! every free segment long enough for the requested duration yields one
//! suggestion anchored at the segment start. Suggestions never overlap a
//! busy block and are strictly ordered by start.

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::at_time;
use crate::config::Config;
use crate::timeparse::{parse_slot_intent, SlotIntent};

use super::block::{blocks_from_events, expand_all_day, merge_blocks, BusyBlock, Event};

/// Default number of slot suggestions returned.
pub const DEFAULT_SUGGESTIONS: usize = 2;

const SLOT_REASON: &str = "earliest free segment";

/// One proposed free slot; `end - start` equals the requested duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedSlot {
    pub start: String,
    pub end: String,
    pub reason: String,
}

fn slot(start: DateTime<Tz>, length: Duration) -> SuggestedSlot {
    SuggestedSlot {
        start: start.to_rfc3339_opts(SecondsFormat::Secs, false),
        end: (start + length).to_rfc3339_opts(SecondsFormat::Secs, false),
        reason: SLOT_REASON.to_string(),
    }
}

/// Earliest free slots of `duration_min` minutes inside
/// `[win_start, win_end)`, given merged, disjoint busy blocks.
pub fn suggest_in_window(
    blocks: &[BusyBlock],
    win_start: DateTime<Tz>,
    win_end: DateTime<Tz>,
    duration_min: i64,
    max_suggestions: usize,
) -> Vec<SuggestedSlot> {
    let need = Duration::minutes(duration_min);
    let mut suggestions = Vec::new();
    let mut cursor = win_start;

    for b in blocks {
        // skip blocks fully outside the window
        if b.end <= win_start || b.start >= win_end {
            continue;
        }

        // free segment from the cursor to the start of this busy block
        if cursor < b.start {
            let seg_end = b.start.min(win_end);
            if seg_end - cursor >= need {
                suggestions.push(slot(cursor, need));
                if suggestions.len() >= max_suggestions {
                    return suggestions;
                }
            }
        }

        // advance the cursor past this busy block
        if b.end > cursor {
            cursor = b.end;
        }
        if cursor >= win_end {
            break;
        }
    }

    // tail segment after the last busy block
    if cursor < win_end && win_end - cursor >= need {
        suggestions.push(slot(cursor, need));
    }

    suggestions
}

fn hhmm_or(s: &str, fallback: NaiveTime) -> NaiveTime {
    let mut parts = s.splitn(2, ':');
    let hh = parts.next().and_then(|p| p.parse().ok());
    let mm = parts.next().and_then(|p| p.parse().ok());
    match (hh, mm) {
        (Some(hh), Some(mm)) => NaiveTime::from_hms_opt(hh, mm, 0).unwrap_or(fallback),
        _ => fallback,
    }
}

/// Working hours `[start, end)` on `day`'s civil date.
pub fn work_window_for(day: DateTime<Tz>, cfg: &Config) -> (DateTime<Tz>, DateTime<Tz>) {
    let start = hhmm_or(
        &cfg.work_hours_start,
        NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is valid"),
    );
    let end = hhmm_or(
        &cfg.work_hours_end,
        NaiveTime::from_hms_opt(18, 0, 0).expect("18:00 is valid"),
    );
    (at_time(day, start), at_time(day, end))
}

/// Standalone slot-suggestion path: parse the slot intent and return the
/// earliest free slots, clamped to working hours. An empty clamped window
/// or no parseable intent yields no suggestions.
pub fn suggest_slots(
    query: &str,
    events: &[Event],
    cfg: &Config,
    now: DateTime<Tz>,
    max_suggestions: usize,
) -> Vec<SuggestedSlot> {
    let Some(intent) = parse_slot_intent(query, now) else {
        return Vec::new();
    };

    let tz = now.timezone();
    let blocks = merge_blocks(
        expand_all_day(&blocks_from_events(events, tz)),
        cfg.edge_policy,
    );

    match intent {
        SlotIntent::AfterTime {
            after,
            duration_min,
        } => {
            let (day_start, day_end) = work_window_for(after, cfg);
            let win_start = after.max(day_start);
            suggest_in_window(&blocks, win_start, day_end, duration_min, max_suggestions)
        }
        SlotIntent::DayWindow {
            start,
            end,
            duration_min,
        } => {
            let (work_start, work_end) = work_window_for(start, cfg);
            let win_start = start.max(work_start);
            let win_end = end.min(work_end);
            if win_end <= win_start {
                return Vec::new();
            }
            suggest_in_window(&blocks, win_start, win_end, duration_min, max_suggestions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Chicago.with_ymd_and_hms(2025, 3, 4, h, m, 0).unwrap()
    }

    fn block(start: DateTime<Tz>, end: DateTime<Tz>) -> BusyBlock {
        BusyBlock {
            title: "busy".to_string(),
            start,
            end,
            all_day: false,
        }
    }

    fn starts_at(s: &SuggestedSlot, h: u32, m: u32) -> bool {
        let dt: DateTime<chrono::FixedOffset> = s.start.parse().unwrap();
        let dt = dt.with_timezone(&Chicago);
        dt == at(h, m)
    }

    #[test]
    fn empty_window_head() {
        let out = suggest_in_window(&[], at(9, 0), at(17, 0), 30, 2);
        assert_eq!(out.len(), 1);
        assert!(starts_at(&out[0], 9, 0));
    }

    #[test]
    fn gap_before_block_and_tail() {
        let blocks = [block(at(10, 0), at(11, 0))];
        let out = suggest_in_window(&blocks, at(9, 0), at(17, 0), 30, 2);
        assert_eq!(out.len(), 2);
        assert!(starts_at(&out[0], 9, 0));
        assert!(starts_at(&out[1], 11, 0));
    }

    #[test]
    fn short_gap_skipped() {
        let blocks = [block(at(9, 15), at(10, 0)), block(at(10, 30), at(11, 0))];
        // 9:00-9:15 and 10:00-10:30 are both under 45 minutes.
        let out = suggest_in_window(&blocks, at(9, 0), at(12, 0), 45, 2);
        assert_eq!(out.len(), 1);
        assert!(starts_at(&out[0], 11, 0));
    }

    #[test]
    fn suggestion_is_duration_not_whole_gap() {
        let out = suggest_in_window(&[], at(9, 0), at(17, 0), 25, 1);
        let start: DateTime<chrono::FixedOffset> = out[0].start.parse().unwrap();
        let end: DateTime<chrono::FixedOffset> = out[0].end.parse().unwrap();
        assert_eq!(end - start, Duration::minutes(25));
        assert_eq!(out[0].reason, "earliest free segment");
    }

    #[test]
    fn caps_at_max_suggestions() {
        let blocks = [
            block(at(10, 0), at(10, 30)),
            block(at(11, 0), at(11, 30)),
            block(at(12, 0), at(12, 30)),
        ];
        let out = suggest_in_window(&blocks, at(9, 0), at(17, 0), 15, 2);
        assert_eq!(out.len(), 2);
        assert!(starts_at(&out[0], 9, 0));
        assert!(starts_at(&out[1], 10, 30));
    }

    #[test]
    fn window_ending_inside_block_has_no_tail() {
        let blocks = [block(at(16, 0), at(18, 0))];
        let out = suggest_in_window(&blocks, at(15, 30), at(17, 0), 30, 2);
        // Only the 15:30-16:00 gap fits.
        assert_eq!(out.len(), 1);
        assert!(starts_at(&out[0], 15, 30));
    }

    #[test]
    fn blocks_outside_window_ignored() {
        let blocks = [block(at(6, 0), at(7, 0)), block(at(20, 0), at(21, 0))];
        let out = suggest_in_window(&blocks, at(9, 0), at(10, 0), 30, 2);
        assert_eq!(out.len(), 1);
        assert!(starts_at(&out[0], 9, 0));
    }

    fn event(start: &str, end: &str) -> Event {
        Event {
            title: "standup".to_string(),
            start: start.to_string(),
            end: end.to_string(),
            all_day: false,
        }
    }

    #[test]
    fn after_time_clamps_to_work_start() {
        let cfg = Config::default();
        let now = at(7, 0);
        let out = suggest_slots("book 30 min after 6:00 today", &[], &cfg, now, 2);
        // 06:00 is before working hours; the first slot starts at 09:00.
        assert!(starts_at(&out[0], 9, 0));
    }

    #[test]
    fn after_time_skips_existing_block() {
        let cfg = Config::default();
        let now = at(8, 0);
        let events = [event("2025-03-04T15:00:00", "2025-03-04T15:30:00")];
        let out = suggest_slots("book 30 min after 15:00 today", &events, &cfg, now, 2);
        assert!(starts_at(&out[0], 15, 30));
    }

    #[test]
    fn day_window_clamped_empty_yields_nothing() {
        let cfg = Config::default();
        let now = at(8, 0);
        // Evening window 17:00-21:00 clamps against work end 18:00 leaving
        // one hour; shrink work hours to make the intersection empty.
        let mut tight = cfg.clone();
        tight.work_hours_end = "12:00".to_string();
        let out = suggest_slots("any slot today evening", &[], &tight, now, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn no_intent_yields_nothing() {
        let cfg = Config::default();
        let out = suggest_slots("what is on my calendar", &[], &cfg, at(8, 0), 2);
        assert!(out.is_empty());
    }
}
