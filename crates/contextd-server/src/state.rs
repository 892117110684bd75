//! Shared application state for the contextd server.

use std::collections::HashMap;
use std::sync::Arc;

use contextd_core::clock::resolve_zone;
use contextd_core::config::Config;
use contextd_core::provider::{
    CodeForgeProvider, DemoCalendarProvider, IcsCalendarProvider, NotesProvider, Provider,
};
use contextd_core::types::Source;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    /// Process-wide configuration snapshot.
    pub config: Config,
    /// Providers registered at startup, keyed by source.
    pub providers: HashMap<Source, Arc<dyn Provider>>,
}

impl AppState {
    /// Register providers according to the configuration: the ICS calendar
    /// when a feed URL is set (demo calendar otherwise), notes and code
    /// only when their tokens are present.
    pub fn from_config(config: Config) -> Self {
        let tz = resolve_zone(&config.default_tz);
        let mut providers: HashMap<Source, Arc<dyn Provider>> = HashMap::new();

        match config.calendar_ics_url.clone() {
            Some(url) => match IcsCalendarProvider::new(url, tz) {
                Ok(p) => {
                    providers.insert(Source::Calendar, Arc::new(p));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "ICS provider unavailable, using demo calendar");
                    providers.insert(Source::Calendar, Arc::new(DemoCalendarProvider::new(tz)));
                }
            },
            None => {
                providers.insert(Source::Calendar, Arc::new(DemoCalendarProvider::new(tz)));
            }
        }

        if let Some(token) = config.notes_api_token.clone() {
            match NotesProvider::new(token) {
                Ok(p) => {
                    providers.insert(Source::Notes, Arc::new(p));
                }
                Err(err) => tracing::warn!(error = %err, "notes provider unavailable"),
            }
        }

        if let Some(token) = config.code_api_token.clone() {
            match CodeForgeProvider::new(token) {
                Ok(p) => {
                    providers.insert(Source::Code, Arc::new(p));
                }
                Err(err) => tracing::warn!(error = %err, "code provider unavailable"),
            }
        }

        Self { config, providers }
    }
}
