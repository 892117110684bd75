//! Zone resolution and civil-time arithmetic.
//!
//! The zone is resolved once per request at entry; everything downstream
//! carries it inside `DateTime<Tz>` values. Tests construct fixed instants
//! and pass them down instead of reading the wall clock.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Resolve an IANA zone name, falling back to the host zone (then UTC)
/// when the name is unknown.
pub fn resolve_zone(name: &str) -> Tz {
    if let Ok(tz) = name.parse::<Tz>() {
        return tz;
    }
    let host = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
    match host.parse::<Tz>() {
        Ok(tz) => {
            tracing::debug!(requested = name, fallback = %tz, "unknown zone, using host zone");
            tz
        }
        Err(_) => {
            tracing::debug!(requested = name, "unknown zone, using UTC");
            Tz::UTC
        }
    }
}

/// Wall clock pinned to a resolved zone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Resolve the configured zone name and pin a clock to it.
    pub fn for_zone_name(name: &str) -> Self {
        Self::new(resolve_zone(name))
    }

    pub fn zone(&self) -> Tz {
        self.tz
    }

    /// Current instant in the pinned zone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clamp raw hour/minute values onto a valid 24-hour civil time.
pub fn clamp_hm(hh: u32, mm: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hh.min(23), mm.min(59), 0)
        .expect("clamped hour/minute are always in range")
}

/// The instant at `time` on `base`'s civil date, in `base`'s zone.
///
/// A civil time skipped by a DST gap falls back to the anchor instant;
/// an ambiguous one resolves to the earlier offset.
pub fn at_time(base: DateTime<Tz>, time: NaiveTime) -> DateTime<Tz> {
    base.with_time(time).earliest().unwrap_or(base)
}

/// Civil midnight of `base`'s date.
pub fn midnight_of(base: DateTime<Tz>) -> DateTime<Tz> {
    at_time(base, NaiveTime::MIN)
}

/// Shift by whole civil days, keeping the wall-clock time.
///
/// Calendar words ("tomorrow", "next thu") move across dates, not across
/// fixed 24-hour spans, so a DST transition must not shift the clock time.
pub fn add_civil_days(base: DateTime<Tz>, days: i64) -> DateTime<Tz> {
    let naive = (base.date_naive() + Duration::days(days)).and_time(base.time());
    base.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| base + Duration::days(days))
}

/// The next occurrence of `target`, strictly after `base`'s date.
///
/// A base already on the target weekday advances a full week.
pub fn next_weekday(base: DateTime<Tz>, target: Weekday) -> DateTime<Tz> {
    let mut days_ahead =
        (target.num_days_from_monday() + 7 - base.weekday().num_days_from_monday()) % 7;
    if days_ahead == 0 {
        days_ahead = 7;
    }
    add_civil_days(base, i64::from(days_ahead))
}
