//! Calendar event collection and busy-block normalization.
//!
//! Events arrive either as typed [`ContextItem`]s or as untyped JSON bags
//! with the same fields; a single adapter normalizes both shapes. Malformed
//! timestamps drop the event silently -- the engine never fails on input.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::Value;

use crate::clock::{add_civil_days, midnight_of};
use crate::config::EdgePolicy;
use crate::types::{ContextItem, Source};

use super::conflict::overlaps;

/// Raw calendar event as carried in context-item metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
}

impl Event {
    /// Read an event out of a typed context item. Non-calendar items and
    /// items without both `start` and `end` in their metadata yield `None`.
    pub fn from_item(item: &ContextItem) -> Option<Event> {
        if item.source != Source::Calendar {
            return None;
        }
        let md = item.metadata.as_ref()?;
        let start = md.get("start")?.as_str()?.to_string();
        let end = md.get("end")?.as_str()?.to_string();
        let title = md
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!item.title.is_empty()).then(|| item.title.clone()))
            .unwrap_or_else(|| "calendar event".to_string());
        let all_day = md.get("all_day").and_then(Value::as_bool).unwrap_or(false);
        Some(Event {
            title,
            start,
            end,
            all_day,
        })
    }

    /// Read an event out of an untyped key-value bag carrying the same
    /// fields as a context item.
    pub fn from_value(value: &Value) -> Option<Event> {
        if value.get("source")?.as_str()? != "calendar" {
            return None;
        }
        let md = value.get("metadata")?.as_object()?;
        let start = md.get("start")?.as_str()?.to_string();
        let end = md.get("end")?.as_str()?.to_string();
        let title = md
            .get("title")
            .and_then(Value::as_str)
            .or_else(|| value.get("title").and_then(Value::as_str))
            .unwrap_or("calendar event")
            .to_string();
        let all_day = md.get("all_day").and_then(Value::as_bool).unwrap_or(false);
        Some(Event {
            title,
            start,
            end,
            all_day,
        })
    }
}

/// Collect calendar events from a batch of typed context items.
pub fn events_from_items(items: &[ContextItem]) -> Vec<Event> {
    items.iter().filter_map(Event::from_item).collect()
}

/// Collect calendar events from a batch of untyped JSON bags.
pub fn events_from_values(values: &[Value]) -> Vec<Event> {
    values.iter().filter_map(Event::from_value).collect()
}

/// Normalized busy interval in the configured zone. Invariant: `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyBlock {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub all_day: bool,
}

/// Parse an ISO-8601 timestamp into the configured zone.
///
/// Offset-carrying forms (including trailing `Z`) convert into `tz`; naive
/// forms attach `tz` directly, resolving DST ambiguity to the earlier
/// offset. Unparseable input yields `None`.
pub fn parse_zoned(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }
    let naive: NaiveDateTime = s.parse().ok()?;
    tz.from_local_datetime(&naive).earliest()
}

/// Normalize raw events into busy blocks, dropping events whose timestamps
/// fail to parse.
pub fn blocks_from_events(events: &[Event], tz: Tz) -> Vec<BusyBlock> {
    events
        .iter()
        .filter_map(|ev| {
            let start = parse_zoned(&ev.start, tz)?;
            let end = parse_zoned(&ev.end, tz)?;
            Some(BusyBlock {
                title: ev.title.clone(),
                start,
                end,
                all_day: ev.all_day,
            })
        })
        .collect()
}

/// Replace all-day blocks with their civil-day span
/// `[midnight, next midnight)` in the block's zone.
pub fn expand_all_day(blocks: &[BusyBlock]) -> Vec<BusyBlock> {
    blocks
        .iter()
        .map(|b| {
            if b.all_day {
                let day_start = midnight_of(b.start);
                BusyBlock {
                    title: b.title.clone(),
                    start: day_start,
                    end: add_civil_days(day_start, 1),
                    all_day: true,
                }
            } else {
                b.clone()
            }
        })
        .collect()
}

/// Merge overlapping or exactly-touching blocks into disjoint intervals
/// sorted by start. Idempotent on already-merged input.
pub fn merge_blocks(mut blocks: Vec<BusyBlock>, policy: EdgePolicy) -> Vec<BusyBlock> {
    blocks.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    let mut merged: Vec<BusyBlock> = Vec::with_capacity(blocks.len());
    for b in blocks {
        match merged.last_mut() {
            Some(last)
                if overlaps(policy, last.start, last.end, b.start, b.end)
                    || last.end == b.start =>
            {
                if b.end > last.end {
                    last.end = b.end;
                }
            }
            _ => merged.push(b),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Timelike};
    use chrono_tz::America::Chicago;
    use serde_json::json;

    fn block(h1: u32, h2: u32) -> BusyBlock {
        BusyBlock {
            title: "b".to_string(),
            start: Chicago.with_ymd_and_hms(2025, 3, 4, h1, 0, 0).unwrap(),
            end: Chicago.with_ymd_and_hms(2025, 3, 4, h2, 0, 0).unwrap(),
            all_day: false,
        }
    }

    #[test]
    fn parse_zoned_offset_forms() {
        let tz = Chicago;
        let a = parse_zoned("2025-03-04T10:00:00-06:00", tz).unwrap();
        let b = parse_zoned("2025-03-04T16:00:00Z", tz).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 10);
    }

    #[test]
    fn parse_zoned_naive_attaches_zone() {
        let dt = parse_zoned("2025-03-04T10:00:00", Chicago).unwrap();
        assert_eq!(dt, Chicago.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn parse_zoned_garbage_is_none() {
        assert!(parse_zoned("not a date", Chicago).is_none());
        assert!(parse_zoned("", Chicago).is_none());
    }

    #[test]
    fn malformed_events_are_dropped() {
        let events = vec![
            Event {
                title: "good".to_string(),
                start: "2025-03-04T10:00:00-06:00".to_string(),
                end: "2025-03-04T11:00:00-06:00".to_string(),
                all_day: false,
            },
            Event {
                title: "bad".to_string(),
                start: "yesterday-ish".to_string(),
                end: "2025-03-04T11:00:00-06:00".to_string(),
                all_day: false,
            },
        ];
        let blocks = blocks_from_events(&events, Chicago);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "good");
    }

    #[test]
    fn expand_all_day_spans_civil_day() {
        let mut b = block(10, 11);
        b.all_day = true;
        let expanded = expand_all_day(&[b]);
        assert_eq!(expanded[0].start.hour(), 0);
        assert_eq!(expanded[0].end - expanded[0].start, Duration::days(1));
    }

    #[test]
    fn expand_preserves_timed_blocks() {
        let b = block(10, 11);
        assert_eq!(expand_all_day(&[b.clone()]), vec![b]);
    }

    #[test]
    fn merge_overlapping_and_touching() {
        let merged = merge_blocks(
            vec![block(13, 14), block(10, 11), block(11, 12), block(13, 15)],
            EdgePolicy::ExclusiveEnd,
        );
        // 10-11 absorbs touching 11-12; 13-14 absorbs overlapping 13-15.
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start.hour(), merged[0].end.hour()), (10, 12));
        assert_eq!((merged[1].start.hour(), merged[1].end.hour()), (13, 15));
    }

    #[test]
    fn merge_keeps_disjoint() {
        let merged = merge_blocks(vec![block(9, 10), block(12, 13)], EdgePolicy::ExclusiveEnd);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge_blocks(
            vec![block(10, 11), block(10, 12), block(15, 16)],
            EdgePolicy::ExclusiveEnd,
        );
        let twice = merge_blocks(once.clone(), EdgePolicy::ExclusiveEnd);
        assert_eq!(once, twice);
    }

    #[test]
    fn event_from_item_requires_calendar_source() {
        let item = ContextItem {
            source: Source::Notes,
            title: "note".to_string(),
            snippet: String::new(),
            url: None,
            metadata: None,
        };
        assert!(Event::from_item(&item).is_none());
    }

    #[test]
    fn event_from_item_reads_metadata() {
        let md = json!({
            "start": "2025-03-04T10:00:00-06:00",
            "end": "2025-03-04T11:00:00-06:00",
            "all_day": false,
            "title": "Project Sync",
        });
        let item = ContextItem {
            source: Source::Calendar,
            title: "ignored".to_string(),
            snippet: String::new(),
            url: None,
            metadata: Some(md.as_object().unwrap().clone()),
        };
        let ev = Event::from_item(&item).unwrap();
        assert_eq!(ev.title, "Project Sync");
        assert!(!ev.all_day);
    }

    #[test]
    fn event_from_item_title_falls_back() {
        let md = json!({
            "start": "2025-03-04T10:00:00",
            "end": "2025-03-04T11:00:00",
        });
        let item = ContextItem {
            source: Source::Calendar,
            title: "Standup".to_string(),
            snippet: String::new(),
            url: None,
            metadata: Some(md.as_object().unwrap().clone()),
        };
        assert_eq!(Event::from_item(&item).unwrap().title, "Standup");
    }

    #[test]
    fn event_from_value_accepts_bags() {
        let bag = json!({
            "source": "calendar",
            "metadata": {
                "start": "2025-03-04T10:00:00",
                "end": "2025-03-04T11:00:00",
                "all_day": true,
            },
        });
        let ev = Event::from_value(&bag).unwrap();
        assert_eq!(ev.title, "calendar event");
        assert!(ev.all_day);

        let other = json!({"source": "notes", "metadata": {"start": "x", "end": "y"}});
        assert!(Event::from_value(&other).is_none());

        let missing = json!({"source": "calendar", "metadata": {"start": "x"}});
        assert!(Event::from_value(&missing).is_none());
    }
}
