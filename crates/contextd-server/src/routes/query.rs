//! The main query endpoint: intent routing, provider fan-out,
//! summarization, and the availability decision.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use contextd_core::availability::{decide_availability, events_from_items, AvailabilityResult};
use contextd_core::clock::ZonedClock;
use contextd_core::intent::{self, IntentKind};
use contextd_core::summarize::summarize;
use contextd_core::types::{ContextItem, ContextPackage, Source, SourceSelect};

use crate::state::AppState;

/// Items requested from each provider.
const FETCH_LIMIT: usize = 5;

const MIN_TOKENS: usize = 64;
const MAX_TOKENS: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// User's natural-language query.
    pub query: String,
    /// Preferred sources; `all` fans out with the intent's source first.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSelect>,
    /// Token budget for the summarized package.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_sources() -> Vec<SourceSelect> {
    vec![SourceSelect::All]
}

fn default_max_tokens() -> usize {
    512
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub intent: IntentKind,
    pub context_items: Vec<ContextItem>,
    pub context_package: ContextPackage,
    pub availability: AvailabilityResult,
}

/// Order the sources to query: explicit selections verbatim, `all`
/// expanded with the classified intent's source first (a general intent
/// keeps the fixed order).
fn select_sources(requested: &[SourceSelect], intent: IntentKind) -> Vec<Source> {
    const EVERY: [Source; 3] = [Source::Calendar, Source::Notes, Source::Code];

    if requested.iter().any(|s| *s == SourceSelect::All) {
        let mut order = Vec::new();
        if let Some(primary) = intent.source() {
            order.push(primary);
        }
        for s in EVERY {
            if !order.contains(&s) {
                order.push(s);
            }
        }
        return order;
    }

    let mut out = Vec::new();
    for sel in requested {
        if let Some(s) = sel.source() {
            if !out.contains(&s) {
                out.push(s);
            }
        }
    }
    out
}

/// `POST /api/query`.
///
/// Provider failures are tolerated: a failing source contributes nothing
/// and the rest of the response is still produced. The availability
/// decider itself is total and never errors.
pub async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let max_tokens = payload.max_tokens.clamp(MIN_TOKENS, MAX_TOKENS);
    let intent = intent::classify(&payload.query);

    let mut items: Vec<ContextItem> = Vec::new();
    for source in select_sources(&payload.sources, intent) {
        let Some(provider) = state.providers.get(&source) else {
            continue;
        };
        match provider.fetch(&payload.query, FETCH_LIMIT).await {
            Ok(mut fetched) => items.append(&mut fetched),
            Err(err) => {
                tracing::warn!(provider = provider.name(), error = %err, "provider fetch failed")
            }
        }
    }

    let context_package = summarize(&items, max_tokens);

    let events = events_from_items(&items);
    let clock = ZonedClock::for_zone_name(&state.config.default_tz);
    let availability = decide_availability(&payload.query, &events, &state.config, clock.now());

    Json(QueryResponse {
        intent,
        context_items: items,
        context_package,
        availability,
    })
}
