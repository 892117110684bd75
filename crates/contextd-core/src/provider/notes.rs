//! Note-store provider.
//!
//! Searches the workspace note store (Notion-compatible search API) for
//! recently edited pages and databases, newest first.

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::types::{ContextItem, Source};

use super::{http_client, Provider};

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";

pub struct NotesProvider {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl NotesProvider {
    pub fn new(token: String) -> Result<Self, ProviderError> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different API root (used by tests).
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, ProviderError> {
        Ok(Self {
            token,
            base_url,
            client: http_client("notes")?,
        })
    }
}

/// Pull a human title out of the page properties: prefer the `Name`
/// property, else the first property of type `title`.
fn title_from_properties(props: &Value) -> Option<String> {
    let props = props.as_object()?;

    let title_text = |prop: &Value| -> Option<String> {
        if prop.get("type")?.as_str()? != "title" {
            return None;
        }
        let text = prop.get("title")?.as_array()?.first()?;
        let plain = text.get("plain_text")?.as_str()?;
        (!plain.is_empty()).then(|| plain.to_string())
    };

    if let Some(name) = props.get("Name").and_then(|p| title_text(p)) {
        return Some(name);
    }
    props.values().find_map(title_text)
}

#[async_trait::async_trait]
impl Provider for NotesProvider {
    fn name(&self) -> &'static str {
        "notes"
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>, ProviderError> {
        let body = json!({
            "query": query,
            "sort": { "direction": "descending", "timestamp": "last_edited_time" },
            "page_size": limit,
        });

        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "notes",
                source,
            })?;
        if !resp.status().is_success() {
            return Err(ProviderError::Status {
                provider: "notes",
                status: resp.status().as_u16(),
            });
        }
        let data: Value = resp.json().await.map_err(|err| ProviderError::Decode {
            provider: "notes",
            reason: err.to_string(),
        })?;

        let mut items = Vec::new();
        for result in data
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let object = result.get("object").and_then(Value::as_str).unwrap_or("");
            if object != "page" && object != "database" {
                continue;
            }

            let title = result
                .get("properties")
                .and_then(title_from_properties)
                .unwrap_or_else(|| "Untitled".to_string());

            let mut metadata = serde_json::Map::new();
            metadata.insert("object".to_string(), Value::String(object.to_string()));
            if let Some(edited) = result.get("last_edited_time").cloned() {
                metadata.insert("last_edited_time".to_string(), edited);
            }

            items.push(ContextItem {
                source: Source::Notes,
                title,
                snippet: if object == "page" {
                    "Notes page".to_string()
                } else {
                    "Notes database".to_string()
                },
                url: result
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                metadata: Some(metadata),
            });
            if items.len() >= limit {
                break;
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn title_prefers_name_property() {
        let props = json!({
            "Other": { "type": "title", "title": [{ "plain_text": "other" }] },
            "Name": { "type": "title", "title": [{ "plain_text": "Roadmap" }] },
        });
        assert_eq!(title_from_properties(&props).unwrap(), "Roadmap");
    }

    #[test]
    fn title_falls_back_to_first_title_property() {
        let props = json!({
            "Status": { "type": "status" },
            "Heading": { "type": "title", "title": [{ "plain_text": "Retro" }] },
        });
        assert_eq!(title_from_properties(&props).unwrap(), "Retro");
    }

    #[test]
    fn title_missing_is_none() {
        assert!(title_from_properties(&json!({})).is_none());
        assert!(title_from_properties(&json!({"Name": {"type": "status"}})).is_none());
    }

    #[tokio::test]
    async fn fetch_maps_pages_and_databases() {
        let server = MockServer::start().await;

        let body = json!({
            "results": [
                {
                    "object": "page",
                    "url": "https://notes.example/p1",
                    "last_edited_time": "2025-03-01T10:00:00.000Z",
                    "properties": {
                        "Name": { "type": "title", "title": [{ "plain_text": "Roadmap" }] }
                    }
                },
                { "object": "database", "properties": {} },
                { "object": "user" }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("Notion-Version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = NotesProvider::with_base_url("tok".to_string(), server.uri()).unwrap();
        let items = provider.fetch("roadmap", 5).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Roadmap");
        assert_eq!(items[0].snippet, "Notes page");
        assert_eq!(items[0].url.as_deref(), Some("https://notes.example/p1"));
        assert_eq!(items[1].title, "Untitled");
        assert_eq!(items[1].snippet, "Notes database");
    }

    #[tokio::test]
    async fn unauthorized_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = NotesProvider::with_base_url("bad".to_string(), server.uri()).unwrap();
        let err = provider.fetch("q", 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }
}
