//! Temporal query parsing.
//!
//! Turns free-form English time expressions into structured windows and
//! slot-finding intents. Strict 24-hour clock; patterns are a small fixed
//! table tried in order, first match wins. Both parsers are total: any
//! input yields a value or no match, never an error.
//!
//! Window patterns:
//!   - "tomorrow 15:10", "today at 8"        -> point
//!   - "next thu 14-15", "next fri 9:30–11"  -> range on the next weekday
//!   - "today afternoon", "tomorrow morning" -> daypart range
//!   - "at 23"                               -> point today
//!
//! Slot intents:
//!   - "book 30 min after 15:00 today", "find 45 m after tomorrow 9"
//!   - "any slot this fri morning for 45 min"
//!   - "any slot tomorrow afternoon for 60 min"

use std::sync::OnceLock;

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use regex::{Captures, Regex};

use crate::clock::{add_civil_days, at_time, clamp_hm, midnight_of, next_weekday};

/// Requested time window. A window with `start == end` is a point query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Window {
    pub fn point(at: DateTime<Tz>) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }
}

/// Named sub-range of a day with fixed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daypart {
    Morning,
    Afternoon,
    Evening,
}

impl Daypart {
    fn parse(label: &str) -> Option<Self> {
        match label {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }

    /// Civil-time bounds of the daypart.
    pub fn bounds(self) -> (NaiveTime, NaiveTime) {
        match self {
            Self::Morning => (clamp_hm(9, 0), clamp_hm(12, 0)),
            Self::Afternoon => (clamp_hm(12, 0), clamp_hm(17, 0)),
            Self::Evening => (clamp_hm(17, 0), clamp_hm(21, 0)),
        }
    }
}

/// Structured slot-finding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIntent {
    /// "book N min after <time>" -- earliest slot at or after the anchor.
    AfterTime {
        after: DateTime<Tz>,
        duration_min: i64,
    },
    /// "any slot <day> [daypart]" -- earliest slots inside a day window.
    DayWindow {
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        duration_min: i64,
    },
}

impl SlotIntent {
    pub fn duration_min(&self) -> i64 {
        match self {
            SlotIntent::AfterTime { duration_min, .. }
            | SlotIntent::DayWindow { duration_min, .. } => *duration_min,
        }
    }
}

/// Default slot duration in minutes when the query omits one.
pub const DEFAULT_DURATION_MIN: i64 = 30;

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

fn day_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(tomorrow|today)\s+(?:at\s+)?(\d{1,2})(?::(\d{2}))?\b")
            .expect("day-time pattern is valid")
    })
}

fn next_weekday_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bnext\s+(mon|tue|wed|thu|thur|thurs|fri|sat|sun)\s+(\d{1,2})(?::(\d{2}))?\s*[–-]\s*(\d{1,2})(?::(\d{2}))?\b",
        )
        .expect("next-weekday pattern is valid")
    })
}

fn day_daypart_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(today|tomorrow)\s+(morning|afternoon|evening)\b")
            .expect("day-daypart pattern is valid")
    })
}

fn at_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bat\s+(\d{1,2})(?::(\d{2}))?\b").expect("at-time pattern is valid")
    })
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:book|find|schedule)\s+(\d{1,3})\s*(?:min(?:ute)?s?|m)\b")
            .expect("duration pattern is valid")
    })
}

fn after_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bafter\b").expect("after pattern is valid"))
}

fn after_time_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2})(?::(\d{2}))?(?:\s+(today|tomorrow))?\b")
            .expect("after-time pattern is valid")
    })
}

fn after_day_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(today|tomorrow)\s+(\d{1,2})(?::(\d{2}))?\b")
            .expect("after-day pattern is valid")
    })
}

fn any_slot_weekday_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bany\s+slot\s+(this|next)\s+(mon|tue|wed|thu|thur|thurs|fri|sat|sun)(?:\s+(morning|afternoon|evening))?(?:\s+for\s+(\d{1,3})\s*(?:min(?:ute)?s?|m))?",
        )
        .expect("any-slot weekday pattern is valid")
    })
}

fn any_slot_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bany\s+slot\s+(today|tomorrow)(?:\s+(morning|afternoon|evening))?(?:\s+for\s+(\d{1,3})\s*(?:min(?:ute)?s?|m))?",
        )
        .expect("any-slot day pattern is valid")
    })
}

// ---------------------------------------------------------------------------
// Capture helpers
// ---------------------------------------------------------------------------

fn num(c: &Captures<'_>, i: usize) -> u32 {
    c.get(i)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn duration_or_default(c: &Captures<'_>, i: usize) -> i64 {
    c.get(i)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_DURATION_MIN)
}

fn anchor_day(word: &str, now: DateTime<Tz>) -> DateTime<Tz> {
    if word == "today" {
        now
    } else {
        add_civil_days(now, 1)
    }
}

fn weekday_token(token: &str) -> Option<chrono::Weekday> {
    use chrono::Weekday::*;
    match token {
        "mon" => Some(Mon),
        "tue" => Some(Tue),
        "wed" => Some(Wed),
        "thu" | "thur" | "thurs" => Some(Thu),
        "fri" => Some(Fri),
        "sat" => Some(Sat),
        "sun" => Some(Sun),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Window parsing
// ---------------------------------------------------------------------------

/// Parse a free/busy window from the query, anchored at `now`.
pub fn parse_window(text: &str, now: DateTime<Tz>) -> Option<Window> {
    let s = text.trim().to_lowercase();

    // today/tomorrow + hh[:mm] -> point
    if let Some(c) = day_time_re().captures(&s) {
        let base = anchor_day(&c[1], now);
        let start = at_time(base, clamp_hm(num(&c, 2), num(&c, 3)));
        return Some(Window::point(start));
    }

    // next <weekday> hh[:mm]-hh[:mm] -> range
    if let Some(c) = next_weekday_range_re().captures(&s) {
        let target = next_weekday(now, weekday_token(&c[1])?);
        let start = at_time(target, clamp_hm(num(&c, 2), num(&c, 3)));
        let mut end = at_time(target, clamp_hm(num(&c, 4), num(&c, 5)));
        if end < start {
            end = start;
        }
        return Some(Window { start, end });
    }

    // today/tomorrow + daypart -> range
    if let Some(c) = day_daypart_re().captures(&s) {
        let base = anchor_day(&c[1], now);
        let (t1, t2) = Daypart::parse(&c[2])?.bounds();
        return Some(Window {
            start: at_time(base, t1),
            end: at_time(base, t2),
        });
    }

    // "at hh[:mm]" -> point today
    if let Some(c) = at_time_re().captures(&s) {
        let start = at_time(now, clamp_hm(num(&c, 1), num(&c, 2)));
        return Some(Window::point(start));
    }

    None
}

// ---------------------------------------------------------------------------
// Slot-intent parsing
// ---------------------------------------------------------------------------

/// Parse a slot-finding intent from the query, anchored at `now`.
pub fn parse_slot_intent(text: &str, now: DateTime<Tz>) -> Option<SlotIntent> {
    let s = text.trim().to_lowercase();

    // Booking-style command with a duration and an "after" anchor. The
    // anchor accepts "<time> [today|tomorrow]" or "(today|tomorrow) <time>".
    if let (Some(dur), Some(after)) = (duration_re().captures(&s), after_re().find(&s)) {
        let duration_min = duration_or_default(&dur, 1);
        let tail = &s[after.end()..];

        if let Some(c) = after_time_first_re().captures(tail) {
            let base = anchor_day(c.get(3).map_or("today", |m| m.as_str()), now);
            let after = at_time(base, clamp_hm(num(&c, 1), num(&c, 2)));
            return Some(SlotIntent::AfterTime {
                after,
                duration_min,
            });
        }
        if let Some(c) = after_day_first_re().captures(tail) {
            let base = anchor_day(&c[1], now);
            let after = at_time(base, clamp_hm(num(&c, 2), num(&c, 3)));
            return Some(SlotIntent::AfterTime {
                after,
                duration_min,
            });
        }
    }

    // "any slot (this|next) <weekday> [daypart] [for N min]"
    if let Some(c) = any_slot_weekday_re().captures(&s) {
        let anchor = if &c[1] == "this" {
            now
        } else {
            add_civil_days(now, 7)
        };
        let day = next_weekday(anchor, weekday_token(&c[2])?);
        let duration_min = duration_or_default(&c, 4);
        let (start, end) = match c.get(3).and_then(|m| Daypart::parse(m.as_str())) {
            Some(part) => {
                let (t1, t2) = part.bounds();
                (at_time(day, t1), at_time(day, t2))
            }
            None => (midnight_of(day), at_time(day, clamp_hm(23, 59))),
        };
        return Some(SlotIntent::DayWindow {
            start,
            end,
            duration_min,
        });
    }

    // "any slot (today|tomorrow) [daypart] [for N min]"
    if let Some(c) = any_slot_day_re().captures(&s) {
        let day = anchor_day(&c[1], now);
        let duration_min = duration_or_default(&c, 3);
        let (start, end) = match c.get(2).and_then(|m| Daypart::parse(m.as_str())) {
            Some(part) => {
                let (t1, t2) = part.bounds();
                (at_time(day, t1), at_time(day, t2))
            }
            None => (at_time(day, clamp_hm(9, 0)), at_time(day, clamp_hm(18, 0))),
        };
        return Some(SlotIntent::DayWindow {
            start,
            end,
            duration_min,
        });
    }

    None
}
