//! Health and version endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /api/health` -- confirms the server is running.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/version` -- service identity and environment.
pub async fn version(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": "contextd",
        "version": env!("CARGO_PKG_VERSION"),
        "env": state.config.app_env,
    }))
}
