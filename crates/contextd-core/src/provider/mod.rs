//! External source adapters.
//!
//! Each provider turns one upstream source (calendar feed, note store,
//! code forge) into [`ContextItem`]s. All network I/O in the crate lives
//! here, behind per-request timeouts; the availability engine never sees a
//! provider error -- callers log and degrade to an empty contribution.

pub mod calendar;
pub mod code;
pub mod notes;

pub use calendar::{DemoCalendarProvider, IcsCalendarProvider};
pub use code::CodeForgeProvider;
pub use notes::NotesProvider;

use crate::error::ProviderError;
use crate::types::ContextItem;

/// Timeout applied to every upstream request, in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A source of context items.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Stable short name used in logs and debug output.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` items relevant to the query.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>, ProviderError>;
}

pub(crate) fn http_client(provider: &'static str) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("contextd/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ProviderError::Request { provider, source })
}
