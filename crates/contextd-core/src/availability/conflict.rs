//! Conflict detection between a parsed window and calendar events.
//!
//! Runs over the unmerged per-event blocks so the report preserves the
//! original titles and spans. All-day events are tested against their
//! civil-day expansion here, per event.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::clock::{add_civil_days, midnight_of};
use crate::config::EdgePolicy;
use crate::timeparse::Window;

use super::block::BusyBlock;

/// Interval overlap under an explicit edge policy.
pub fn overlaps(
    policy: EdgePolicy,
    a_start: DateTime<Tz>,
    a_end: DateTime<Tz>,
    b_start: DateTime<Tz>,
    b_end: DateTime<Tz>,
) -> bool {
    match policy {
        EdgePolicy::ExclusiveEnd => a_start < b_end && b_start < a_end,
        EdgePolicy::Inclusive => a_start <= b_end && b_start <= a_end,
    }
}

/// Blocks conflicting with the window, sorted by `(start, end)`.
///
/// Point windows are containment checks: `start <= point < end` under
/// `ExclusiveEnd`, `start <= point <= end` under `Inclusive`. Range windows
/// use the policy overlap. All-day blocks conflict with a point iff the
/// point falls on the event's civil date.
pub fn find_conflicts(blocks: &[BusyBlock], window: &Window, policy: EdgePolicy) -> Vec<BusyBlock> {
    let point = window.is_point();
    let mut out: Vec<BusyBlock> = blocks
        .iter()
        .filter(|b| {
            if b.all_day {
                let day_start = midnight_of(b.start);
                let day_end = add_civil_days(day_start, 1);
                if point {
                    day_start <= window.start && window.start < day_end
                } else {
                    overlaps(policy, window.start, window.end, day_start, day_end)
                }
            } else if point {
                b.start <= window.start
                    && match policy {
                        EdgePolicy::ExclusiveEnd => window.start < b.end,
                        EdgePolicy::Inclusive => window.start <= b.end,
                    }
            } else {
                overlaps(policy, window.start, window.end, b.start, b.end)
            }
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    out
}
