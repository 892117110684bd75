//! contextd HTTP API server.
//!
//! Exposes `contextd-core` over a small REST surface. The server owns zero
//! business logic -- only routing, serialization, and CORS/tracing
//! middleware; intent detection, provider fan-out, summarization, and the
//! availability decision all live in the core.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete axum router with all API routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/version", get(routes::health::version))
        .route("/query", post(routes::query::handle_query))
        // Debug
        .route("/debug/providers", get(routes::debug::providers))
        .route("/debug/settings", get(routes::debug::settings))
        .route("/debug/calendar", get(routes::debug::calendar_preview))
        .route("/debug/calendar/diag", get(routes::debug::calendar_diag));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
