//! Error types shared across the core.

/// Errors surfaced by the external source providers.
///
/// Provider failures never reach the availability engine; callers log them
/// and degrade to an empty contribution for that source.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("failed to decode {provider} response: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },
}

/// Errors raised while loading configuration from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
