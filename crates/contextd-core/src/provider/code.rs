//! Code-forge provider.
//!
//! Searches the forge's issue index for open issues and pull requests
//! matching the query, most recently updated first.

use serde_json::Value;

use crate::error::ProviderError;
use crate::types::{ContextItem, Source};

use super::{http_client, Provider};

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// The search endpoint caps useful context at a handful of results.
const MAX_RESULTS: usize = 5;

pub struct CodeForgeProvider {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl CodeForgeProvider {
    pub fn new(token: String) -> Result<Self, ProviderError> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different API root (used by tests).
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, ProviderError> {
        Ok(Self {
            token,
            base_url,
            client: http_client("code")?,
        })
    }
}

fn context_item(node: &Value) -> ContextItem {
    let title = node
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("forge item")
        .to_string();
    let is_pr = node.get("pull_request").is_some();
    let state = node.get("state").and_then(Value::as_str).unwrap_or("open");
    let author = node
        .pointer("/user/login")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut metadata = serde_json::Map::new();
    metadata.insert("is_pr".to_string(), Value::Bool(is_pr));
    if let Some(repo_url) = node.get("repository_url").and_then(Value::as_str) {
        let repo = repo_url.rsplit('/').next().unwrap_or_default();
        metadata.insert("repo".to_string(), Value::String(repo.to_string()));
    }
    if let Some(updated) = node.get("updated_at").cloned() {
        metadata.insert("updated_at".to_string(), updated);
    }
    let labels: Vec<Value> = node
        .pointer("/labels")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|l| l.get("name").cloned())
        .collect();
    metadata.insert("labels".to_string(), Value::Array(labels));

    ContextItem {
        source: Source::Code,
        title,
        snippet: format!(
            "{} | {} | by {}",
            if is_pr { "PR" } else { "Issue" },
            state,
            author
        ),
        url: node
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        metadata: Some(metadata),
    }
}

#[async_trait::async_trait]
impl Provider for CodeForgeProvider {
    fn name(&self) -> &'static str {
        "code"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>, ProviderError> {
        let q = query.trim();
        let q = if q.is_empty() {
            "is:open".to_string()
        } else {
            format!("{q} is:open")
        };
        let per_page = limit.min(MAX_RESULTS).to_string();

        let resp = self
            .client
            .get(format!("{}/search/issues", self.base_url))
            .query(&[
                ("q", q.as_str()),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ])
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "code",
                source,
            })?;
        if !resp.status().is_success() {
            return Err(ProviderError::Status {
                provider: "code",
                status: resp.status().as_u16(),
            });
        }
        let data: Value = resp.json().await.map_err(|err| ProviderError::Decode {
            provider: "code",
            reason: err.to_string(),
        })?;

        Ok(data
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .take(limit)
            .map(context_item)
            .collect())
    }
}
