//! Debug endpoints: registered providers, redacted settings, and a
//! calendar preview for diagnosing the feed path.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use contextd_core::clock::resolve_zone;
use contextd_core::provider::calendar::scan_feed;
use contextd_core::provider::IcsCalendarProvider;
use contextd_core::types::Source;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/debug/providers` -- which provider backs each source.
pub async fn providers(State(state): State<Arc<AppState>>) -> Json<Value> {
    let map: serde_json::Map<String, Value> = state
        .providers
        .iter()
        .map(|(source, provider)| (source.to_string(), json!(provider.name())))
        .collect();
    Json(Value::Object(map))
}

/// `GET /api/debug/settings` -- configuration with secrets redacted to
/// presence booleans.
pub async fn settings(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cfg = &state.config;
    Json(json!({
        "app_env": cfg.app_env,
        "default_tz": cfg.default_tz,
        "work_hours_start": cfg.work_hours_start,
        "work_hours_end": cfg.work_hours_end,
        "edge_policy": cfg.edge_policy,
        "calendar_ics_url_set": cfg.calendar_ics_url.is_some(),
        "notes_api_token_set": cfg.notes_api_token.is_some(),
        "code_api_token_set": cfg.code_api_token.is_some(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    #[serde(default = "default_preview_limit")]
    pub limit: usize,
}

fn default_preview_limit() -> usize {
    10
}

/// `GET /api/debug/calendar/diag` -- deep-dive diagnostics for the ICS
/// fetch/parse path, staged so a transport problem and a feed-content
/// problem are distinguishable: the fetch report carries the status, a
/// header sample, and the leading bytes; the parse report carries the raw
/// event count and a peek at the first event's fields.
pub async fn calendar_diag(State(state): State<Arc<AppState>>) -> Json<Value> {
    let Some(url) = state.config.calendar_ics_url.clone() else {
        return Json(json!({ "ok": false, "why": "CALENDAR_ICS_URL is not set" }));
    };

    let tz = resolve_zone(&state.config.default_tz);
    let provider = match IcsCalendarProvider::new(url, tz) {
        Ok(p) => p,
        Err(err) => {
            return Json(json!({ "ok": false, "stage": "fetch", "error": err.to_string() }))
        }
    };

    // 1) Fetch
    let raw = match provider.fetch_raw().await {
        Ok(raw) => raw,
        Err(err) => {
            return Json(json!({ "ok": false, "stage": "fetch", "error": err.to_string() }))
        }
    };
    let fetch = json!({
        "ok": raw.ok,
        "status": raw.status,
        "url": raw.url,
        "headers_sample": raw.headers_sample,
        "first_300_chars": raw.first_300_chars,
    });

    // 2) Parse
    let (events_found, peek) = scan_feed(&raw.body);
    Json(json!({
        "ok": true,
        "stage": "parse",
        "events_found": events_found,
        "fetch": fetch,
        "peek": peek,
    }))
}

/// `GET /api/debug/calendar?limit=N` -- fetch straight from the calendar
/// provider to diagnose the feed path.
pub async fn calendar_preview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<Value>, ApiError> {
    let provider = state
        .providers
        .get(&Source::Calendar)
        .ok_or_else(|| ApiError::NotFound("no calendar provider registered".to_string()))?;

    let limit = params.limit.clamp(1, 50);
    let items = provider.fetch("debug", limit).await?;

    Ok(Json(json!({
        "provider": provider.name(),
        "count": items.len(),
        "items": items,
    })))
}
