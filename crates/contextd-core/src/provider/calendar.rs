//! Calendar feed providers.
//!
//! [`IcsCalendarProvider`] pulls upcoming events from an ICS feed URL and
//! emits them as context items with `start`/`end`/`all_day` metadata for
//! the availability engine. [`DemoCalendarProvider`] is the deterministic
//! dev/test fallback used when no feed is configured.
//!
//! The ICS parser is deliberately small: it unfolds continuation lines and
//! reads `SUMMARY`, `DTSTART`, and `DTEND` from each `VEVENT`. Recurrence
//! rules are not expanded; feeds are expected to arrive pre-expanded.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::types::{ContextItem, Source};

use super::{http_client, Provider};

/// How far ahead fetched events are kept.
const HORIZON_DAYS: i64 = 30;

/// One event lifted out of the feed, normalized to the configured zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeedEvent {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub all_day: bool,
}

fn iso(dt: DateTime<Tz>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn context_item(ev: &FeedEvent) -> ContextItem {
    let mut metadata = serde_json::Map::new();
    metadata.insert("start".to_string(), Value::String(iso(ev.start)));
    metadata.insert("end".to_string(), Value::String(iso(ev.end)));
    metadata.insert("all_day".to_string(), Value::Bool(ev.all_day));
    metadata.insert("title".to_string(), Value::String(ev.title.clone()));

    ContextItem {
        source: Source::Calendar,
        title: ev.title.clone(),
        snippet: format!(
            "{} - {} (local time)",
            ev.start.format("%Y-%m-%d %H:%M"),
            ev.end.format("%H:%M")
        ),
        url: None,
        metadata: Some(metadata),
    }
}

/// Unfold RFC 5545 folded lines: a line starting with space or tab
/// continues the previous one.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(prev) = lines.last_mut() {
                prev.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

/// Parse a DTSTART/DTEND value into the configured zone.
///
/// Date-only values (or `VALUE=DATE` parameters) mark the event all-day at
/// civil midnight. `...Z` stamps are UTC; floating stamps attach the
/// parameter `TZID` zone when present, else the configured zone.
fn parse_stamp(value: &str, params: &[&str], tz: Tz) -> Option<(DateTime<Tz>, bool)> {
    let value = value.trim();

    let date_only = params.iter().any(|p| p.eq_ignore_ascii_case("VALUE=DATE"))
        || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()));
    if date_only {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        let dt = tz.from_local_datetime(&date.and_time(NaiveTime::MIN)).earliest()?;
        return Some((dt, true));
    }

    if let Some(stamp) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").ok()?;
        return Some((Utc.from_utc_datetime(&naive).with_timezone(&tz), false));
    }

    let zone = params
        .iter()
        .find_map(|p| p.strip_prefix("TZID="))
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(tz);
    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    Some((zone.from_local_datetime(&naive).earliest()?.with_timezone(&tz), false))
}

/// Parse the feed into events within `[now, now + horizon)`, sorted by
/// start. Events missing a summary or an unparseable start are skipped.
pub(crate) fn parse_feed(text: &str, tz: Tz, now: DateTime<Tz>) -> Vec<FeedEvent> {
    let horizon = now + Duration::days(HORIZON_DAYS);
    let mut events: Vec<FeedEvent> = Vec::new();

    let mut in_event = false;
    let mut summary: Option<String> = None;
    let mut start: Option<(DateTime<Tz>, bool)> = None;
    let mut end: Option<(DateTime<Tz>, bool)> = None;

    for line in unfold(text) {
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            in_event = true;
            summary = None;
            start = None;
            end = None;
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            in_event = false;
            if let (Some(title), Some((dtstart, all_day))) = (summary.take(), start.take()) {
                let dtend = end
                    .take()
                    .map(|(dt, _)| dt)
                    .unwrap_or_else(|| {
                        if all_day {
                            crate::clock::add_civil_days(dtstart, 1)
                        } else {
                            dtstart
                        }
                    });
                if dtend < now || dtstart > horizon {
                    continue;
                }
                events.push(FeedEvent {
                    title,
                    start: dtstart,
                    end: dtend,
                    all_day,
                });
            }
            continue;
        }
        if !in_event {
            continue;
        }

        let Some((head, value)) = line.split_once(':') else {
            continue;
        };
        let mut parts = head.split(';');
        let name = parts.next().unwrap_or_default().to_ascii_uppercase();
        let params: Vec<&str> = parts.collect();

        match name.as_str() {
            "SUMMARY" => summary = Some(value.trim().to_string()),
            "DTSTART" => start = parse_stamp(value, &params, tz),
            "DTEND" => end = parse_stamp(value, &params, tz),
            _ => {}
        }
    }

    events.sort_by(|a, b| a.start.cmp(&b.start));
    events
}

/// Raw fields of the first `VEVENT`, for the diagnostics route.
#[derive(Debug, Clone, Serialize)]
pub struct EventPeek {
    pub summary: Option<String>,
    pub dtstart_raw: Option<String>,
    pub dtend_raw: Option<String>,
}

/// Count `VEVENT` blocks and peek the first one's raw property values.
///
/// Unlike [`parse_feed`] this applies no horizon filtering or timestamp
/// parsing, so the diagnostics route can report what the feed actually
/// contains even when normalization would drop everything.
pub fn scan_feed(text: &str) -> (usize, Option<EventPeek>) {
    let mut count = 0usize;
    let mut peek: Option<EventPeek> = None;
    let mut in_event = false;

    for line in unfold(text) {
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            in_event = true;
            count += 1;
            if peek.is_none() {
                peek = Some(EventPeek {
                    summary: None,
                    dtstart_raw: None,
                    dtend_raw: None,
                });
            }
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            in_event = false;
            continue;
        }
        if !in_event || count > 1 {
            continue;
        }

        let Some((head, value)) = line.split_once(':') else {
            continue;
        };
        let name = head.split(';').next().unwrap_or_default().to_ascii_uppercase();
        if let Some(first) = peek.as_mut() {
            match name.as_str() {
                "SUMMARY" => first.summary = Some(value.trim().to_string()),
                "DTSTART" => first.dtstart_raw = Some(value.trim().to_string()),
                "DTEND" => first.dtend_raw = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    (count, peek)
}

/// Outcome of the raw fetch stage of feed diagnostics. Transport
/// succeeded; `ok` reflects the HTTP status.
#[derive(Debug, Clone)]
pub struct RawFeedFetch {
    pub ok: bool,
    pub status: u16,
    pub url: String,
    pub headers_sample: serde_json::Map<String, Value>,
    pub first_300_chars: Option<String>,
    pub body: String,
}

/// Response headers surfaced in the fetch report.
const HEADERS_SAMPLE: &[&str] = &["content-type", "content-length", "etag", "last-modified"];

/// Live calendar provider backed by an ICS feed URL.
pub struct IcsCalendarProvider {
    url: String,
    tz: Tz,
    client: reqwest::Client,
}

impl IcsCalendarProvider {
    pub fn new(url: String, tz: Tz) -> Result<Self, ProviderError> {
        Ok(Self {
            url,
            tz,
            client: http_client("calendar")?,
        })
    }

    /// Fetch the feed without parsing it, reporting transport-level detail
    /// (status, header sample, leading bytes) for the diagnostics route.
    pub async fn fetch_raw(&self) -> Result<RawFeedFetch, ProviderError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "calendar",
                source,
            })?;
        let status = resp.status();
        let url = resp.url().to_string();

        let mut headers_sample = serde_json::Map::new();
        for key in HEADERS_SAMPLE {
            let value = resp
                .headers()
                .get(*key)
                .and_then(|v| v.to_str().ok())
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            headers_sample.insert((*key).to_string(), value);
        }

        let body = resp.text().await.map_err(|source| ProviderError::Request {
            provider: "calendar",
            source,
        })?;
        let first_300_chars = (!body.is_empty()).then(|| body.chars().take(300).collect());

        Ok(RawFeedFetch {
            ok: status.is_success(),
            status: status.as_u16(),
            url,
            headers_sample,
            first_300_chars,
            body,
        })
    }
}

#[async_trait::async_trait]
impl Provider for IcsCalendarProvider {
    fn name(&self) -> &'static str {
        "calendar_ics"
    }

    async fn fetch(&self, _query: &str, limit: usize) -> Result<Vec<ContextItem>, ProviderError> {
        let raw = self.fetch_raw().await?;
        if !raw.ok {
            return Err(ProviderError::Status {
                provider: "calendar",
                status: raw.status,
            });
        }

        let now = Utc::now().with_timezone(&self.tz);
        let events = parse_feed(&raw.body, self.tz, now);
        tracing::debug!(count = events.len(), "parsed calendar feed");

        Ok(events.iter().take(limit).map(context_item).collect())
    }
}

/// Deterministic dev/test calendar: one `Project Sync` meeting 10:00-11:00,
/// today or tomorrow depending on the query.
pub struct DemoCalendarProvider {
    tz: Tz,
}

impl DemoCalendarProvider {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

#[async_trait::async_trait]
impl Provider for DemoCalendarProvider {
    fn name(&self) -> &'static str {
        "calendar_demo"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>, ProviderError> {
        let now = Utc::now().with_timezone(&self.tz);
        let day = if query.to_lowercase().contains("tomorrow") {
            crate::clock::add_civil_days(now, 1)
        } else {
            now
        };
        let start = crate::clock::at_time(day, crate::clock::clamp_hm(10, 0));
        let event = FeedEvent {
            title: "Project Sync".to_string(),
            start,
            end: start + Duration::hours(1),
            all_day: false,
        };
        Ok(std::iter::once(context_item(&event)).take(limit).collect())
    }
}
